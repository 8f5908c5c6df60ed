use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_accounts_tables::Migration),
            Box::new(m20240601_000002_create_stock_tables::Migration),
            Box::new(m20240601_000003_create_dispatch_tables::Migration),
            Box::new(m20240601_000004_create_erection_tables::Migration),
            Box::new(m20240601_000005_create_work_order_tables::Migration),
        ]
    }
}

fn pk(col: impl IntoIden) -> ColumnDef {
    ColumnDef::new(col)
        .integer()
        .not_null()
        .auto_increment()
        .primary_key()
        .to_owned()
}

fn index(name: &str, table: impl IntoIden + 'static, col: impl IntoIden) -> IndexCreateStatement {
    Index::create()
        .name(name)
        .table(table)
        .col(col)
        .if_not_exists()
        .to_owned()
}

mod m20240601_000001_create_accounts_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_accounts_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(&mut pk(Users::Id))
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::Role).string_len(32).not_null())
                        .col(ColumnDef::new(Users::ClientId).integer().null())
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Sessions::Table)
                        .if_not_exists()
                        .col(&mut pk(Sessions::Id))
                        .col(
                            ColumnDef::new(Sessions::SessionId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Sessions::UserId).integer().not_null())
                        .col(
                            ColumnDef::new(Sessions::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Sessions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_sessions_user_id")
                                .from(Sessions::Table, Sessions::UserId)
                                .to(Users::Table, Users::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(EndClients::Table)
                        .if_not_exists()
                        .col(&mut pk(EndClients::Id))
                        .col(ColumnDef::new(EndClients::Name).string().not_null())
                        .col(ColumnDef::new(EndClients::ClientId).integer().not_null())
                        .col(
                            ColumnDef::new(EndClients::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(index(
                    "idx_end_clients_client_id",
                    EndClients::Table,
                    EndClients::ClientId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(EndClients::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Sessions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        Role,
        ClientId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Sessions {
        Table,
        Id,
        SessionId,
        UserId,
        ExpiresAt,
        CreatedAt,
    }

    #[derive(Iden)]
    enum EndClients {
        Table,
        Id,
        Name,
        ClientId,
        CreatedAt,
    }
}

mod m20240601_000002_create_stock_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_stock_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Precast::Table)
                        .if_not_exists()
                        .col(&mut pk(Precast::Id))
                        .col(ColumnDef::new(Precast::ProjectId).integer().not_null())
                        .col(ColumnDef::new(Precast::Name).string().not_null())
                        .col(ColumnDef::new(Precast::ParentId).integer().null())
                        .col(
                            ColumnDef::new(Precast::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ElementTypes::Table)
                        .if_not_exists()
                        .col(&mut pk(ElementTypes::Id))
                        .col(ColumnDef::new(ElementTypes::ProjectId).integer().not_null())
                        .col(ColumnDef::new(ElementTypes::ElementType).string().not_null())
                        .col(
                            ColumnDef::new(ElementTypes::ElementTypeName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ElementTypes::ThicknessMm).double().not_null())
                        .col(ColumnDef::new(ElementTypes::LengthMm).double().not_null())
                        .col(ColumnDef::new(ElementTypes::HeightMm).double().not_null())
                        .col(ColumnDef::new(ElementTypes::Density).double().not_null())
                        .col(
                            ColumnDef::new(ElementTypes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Elements::Table)
                        .if_not_exists()
                        .col(&mut pk(Elements::Id))
                        .col(ColumnDef::new(Elements::ProjectId).integer().not_null())
                        .col(ColumnDef::new(Elements::ElementTypeId).integer().not_null())
                        .col(ColumnDef::new(Elements::Name).string().not_null())
                        .col(ColumnDef::new(Elements::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Elements::Disable)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Elements::TargetLocation).integer().null())
                        .col(
                            ColumnDef::new(Elements::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Elements::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_elements_element_type_id")
                                .from(Elements::Table, Elements::ElementTypeId)
                                .to(ElementTypes::Table, ElementTypes::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PrecastStock::Table)
                        .if_not_exists()
                        .col(&mut pk(PrecastStock::Id))
                        .col(
                            ColumnDef::new(PrecastStock::ElementId)
                                .integer()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(PrecastStock::ProjectId).integer().not_null())
                        .col(
                            ColumnDef::new(PrecastStock::ElementTypeId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PrecastStock::ElementType).string().not_null())
                        .col(ColumnDef::new(PrecastStock::StockyardId).integer().null())
                        .col(ColumnDef::new(PrecastStock::StorageLocation).string().null())
                        .col(ColumnDef::new(PrecastStock::ThicknessMm).double().not_null())
                        .col(ColumnDef::new(PrecastStock::LengthMm).double().not_null())
                        .col(ColumnDef::new(PrecastStock::HeightMm).double().not_null())
                        .col(ColumnDef::new(PrecastStock::Weight).double().not_null())
                        .col(ColumnDef::new(PrecastStock::TargetLocation).integer().null())
                        .col(
                            ColumnDef::new(PrecastStock::LifecycleState)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrecastStock::ErectionRequested)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(PrecastStock::DispatchStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrecastStock::DispatchEnd)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrecastStock::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrecastStock::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_precast_stock_element_id")
                                .from(PrecastStock::Table, PrecastStock::ElementId)
                                .to(Elements::Table, Elements::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockApprovalLogs::Table)
                        .if_not_exists()
                        .col(&mut pk(StockApprovalLogs::Id))
                        .col(
                            ColumnDef::new(StockApprovalLogs::PrecastStockId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockApprovalLogs::ElementId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockApprovalLogs::ProjectId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockApprovalLogs::Status).string().not_null())
                        .col(
                            ColumnDef::new(StockApprovalLogs::ActedBy)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockApprovalLogs::Comments).text().null())
                        .col(
                            ColumnDef::new(StockApprovalLogs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(index(
                    "idx_precast_project_id",
                    Precast::Table,
                    Precast::ProjectId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_elements_project_id",
                    Elements::Table,
                    Elements::ProjectId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_precast_stock_project_id",
                    PrecastStock::Table,
                    PrecastStock::ProjectId,
                ))
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_precast_stock_erection_pick")
                        .table(PrecastStock::Table)
                        .col(PrecastStock::ElementTypeId)
                        .col(PrecastStock::TargetLocation)
                        .col(PrecastStock::ErectionRequested)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_stock_approval_logs_element_id",
                    StockApprovalLogs::Table,
                    StockApprovalLogs::ElementId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                StockApprovalLogs::Table.into_iden(),
                PrecastStock::Table.into_iden(),
                Elements::Table.into_iden(),
                ElementTypes::Table.into_iden(),
                Precast::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Precast {
        Table,
        Id,
        ProjectId,
        Name,
        ParentId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum ElementTypes {
        Table,
        Id,
        ProjectId,
        ElementType,
        ElementTypeName,
        ThicknessMm,
        LengthMm,
        HeightMm,
        Density,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Elements {
        Table,
        Id,
        ProjectId,
        ElementTypeId,
        Name,
        Status,
        Disable,
        TargetLocation,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum PrecastStock {
        Table,
        Id,
        ElementId,
        ProjectId,
        ElementTypeId,
        ElementType,
        StockyardId,
        StorageLocation,
        ThicknessMm,
        LengthMm,
        HeightMm,
        Weight,
        TargetLocation,
        LifecycleState,
        ErectionRequested,
        DispatchStart,
        DispatchEnd,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum StockApprovalLogs {
        Table,
        Id,
        PrecastStockId,
        ElementId,
        ProjectId,
        Status,
        ActedBy,
        Comments,
        CreatedAt,
    }
}

mod m20240601_000003_create_dispatch_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_dispatch_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Vehicles::Table)
                        .if_not_exists()
                        .col(&mut pk(Vehicles::Id))
                        .col(
                            ColumnDef::new(Vehicles::VehicleNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Vehicles::DriverName).string().not_null())
                        .col(ColumnDef::new(Vehicles::DriverPhone).string().not_null())
                        .col(ColumnDef::new(Vehicles::EmergencyContact).string().null())
                        .col(ColumnDef::new(Vehicles::Capacity).double().null())
                        .col(ColumnDef::new(Vehicles::TransporterId).integer().null())
                        .col(ColumnDef::new(Vehicles::TruckType).string().null())
                        .col(
                            ColumnDef::new(Vehicles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Vehicles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchOrders::Table)
                        .if_not_exists()
                        .col(&mut pk(DispatchOrders::Id))
                        .col(
                            ColumnDef::new(DispatchOrders::OrderNumber)
                                .string_len(16)
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(DispatchOrders::ProjectId).integer().not_null())
                        .col(
                            ColumnDef::new(DispatchOrders::DispatchDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchOrders::VehicleId).integer().not_null())
                        .col(
                            ColumnDef::new(DispatchOrders::DispatchedBy)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchOrders::RecipientId).integer().null())
                        .col(ColumnDef::new(DispatchOrders::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(DispatchOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_orders_vehicle_id")
                                .from(DispatchOrders::Table, DispatchOrders::VehicleId)
                                .to(Vehicles::Table, Vehicles::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchDetails::Table)
                        .if_not_exists()
                        .col(&mut pk(DispatchDetails::Id))
                        .col(
                            ColumnDef::new(DispatchDetails::DispatchOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchDetails::VehicleId).integer().not_null())
                        .col(ColumnDef::new(DispatchDetails::DriverName).string().not_null())
                        .col(
                            ColumnDef::new(DispatchDetails::CurrentStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchDetails::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_details_order_id")
                                .from(DispatchDetails::Table, DispatchDetails::DispatchOrderId)
                                .to(DispatchOrders::Table, DispatchOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchOrderItems::Table)
                        .if_not_exists()
                        .col(&mut pk(DispatchOrderItems::Id))
                        .col(
                            ColumnDef::new(DispatchOrderItems::DispatchOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchOrderItems::ElementId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchOrderItems::PrecastStockId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchOrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_order_items_order_id")
                                .from(
                                    DispatchOrderItems::Table,
                                    DispatchOrderItems::DispatchOrderId,
                                )
                                .to(DispatchOrders::Table, DispatchOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispatchTrackingLogs::Table)
                        .if_not_exists()
                        .col(&mut pk(DispatchTrackingLogs::Id))
                        .col(
                            ColumnDef::new(DispatchTrackingLogs::DispatchOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchTrackingLogs::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispatchTrackingLogs::Location)
                                .string_len(40)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispatchTrackingLogs::Remarks).text().not_null())
                        .col(
                            ColumnDef::new(DispatchTrackingLogs::StatusTimestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_dispatch_tracking_logs_order_id")
                                .from(
                                    DispatchTrackingLogs::Table,
                                    DispatchTrackingLogs::DispatchOrderId,
                                )
                                .to(DispatchOrders::Table, DispatchOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(index(
                    "idx_dispatch_orders_project_id",
                    DispatchOrders::Table,
                    DispatchOrders::ProjectId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_dispatch_details_order_id",
                    DispatchDetails::Table,
                    DispatchDetails::DispatchOrderId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_dispatch_order_items_order_id",
                    DispatchOrderItems::Table,
                    DispatchOrderItems::DispatchOrderId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_dispatch_order_items_element_id",
                    DispatchOrderItems::Table,
                    DispatchOrderItems::ElementId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_dispatch_tracking_logs_order_id",
                    DispatchTrackingLogs::Table,
                    DispatchTrackingLogs::DispatchOrderId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                DispatchTrackingLogs::Table.into_iden(),
                DispatchOrderItems::Table.into_iden(),
                DispatchDetails::Table.into_iden(),
                DispatchOrders::Table.into_iden(),
                Vehicles::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    enum Vehicles {
        Table,
        Id,
        VehicleNumber,
        DriverName,
        DriverPhone,
        EmergencyContact,
        Capacity,
        TransporterId,
        TruckType,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum DispatchOrders {
        Table,
        Id,
        OrderNumber,
        ProjectId,
        DispatchDate,
        VehicleId,
        DispatchedBy,
        RecipientId,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum DispatchDetails {
        Table,
        Id,
        DispatchOrderId,
        VehicleId,
        DriverName,
        CurrentStatus,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum DispatchOrderItems {
        Table,
        Id,
        DispatchOrderId,
        ElementId,
        PrecastStockId,
        CreatedAt,
    }

    #[derive(Iden)]
    enum DispatchTrackingLogs {
        Table,
        Id,
        DispatchOrderId,
        Status,
        Location,
        Remarks,
        StatusTimestamp,
    }
}

mod m20240601_000004_create_erection_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_erection_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockErected::Table)
                        .if_not_exists()
                        .col(&mut pk(StockErected::Id))
                        .col(
                            ColumnDef::new(StockErected::PrecastStockId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockErected::ElementId).integer().not_null())
                        .col(ColumnDef::new(StockErected::ProjectId).integer().not_null())
                        .col(
                            ColumnDef::new(StockErected::OrderAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockErected::ApprovedStatus).boolean().null())
                        .col(
                            ColumnDef::new(StockErected::ReceivedInErection)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockErected::Erected)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockErected::ActionApproveOrReject)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(StockErected::Comments).text().null())
                        .col(ColumnDef::new(StockErected::RequestedBy).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockErectedLogs::Table)
                        .if_not_exists()
                        .col(&mut pk(StockErectedLogs::Id))
                        .col(
                            ColumnDef::new(StockErectedLogs::StockErectedId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockErectedLogs::ElementId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockErectedLogs::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockErectedLogs::ActedBy).integer().not_null())
                        .col(ColumnDef::new(StockErectedLogs::Comments).text().null())
                        .col(
                            ColumnDef::new(StockErectedLogs::ActionTimestamp)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_erected_logs_request_id")
                                .from(StockErectedLogs::Table, StockErectedLogs::StockErectedId)
                                .to(StockErected::Table, StockErected::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(index(
                    "idx_stock_erected_element_id",
                    StockErected::Table,
                    StockErected::ElementId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_stock_erected_project_id",
                    StockErected::Table,
                    StockErected::ProjectId,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_stock_erected_logs_request_id",
                    StockErectedLogs::Table,
                    StockErectedLogs::StockErectedId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockErectedLogs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockErected::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum StockErected {
        Table,
        Id,
        PrecastStockId,
        ElementId,
        ProjectId,
        OrderAt,
        ApprovedStatus,
        ReceivedInErection,
        Erected,
        ActionApproveOrReject,
        Comments,
        RequestedBy,
    }

    #[derive(Iden)]
    enum StockErectedLogs {
        Table,
        Id,
        StockErectedId,
        ElementId,
        Status,
        ActedBy,
        Comments,
        ActionTimestamp,
    }
}

mod m20240601_000005_create_work_order_tables {
    use super::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_work_order_tables"
        }
    }

    /// Columns shared by the live work-order table and its revision table.
    fn work_order_payload(table: &mut TableCreateStatement) {
        table
            .col(ColumnDef::new(WorkOrders::WoNumber).string().not_null())
            .col(ColumnDef::new(WorkOrders::Revision).integer().not_null())
            .col(ColumnDef::new(WorkOrders::ProjectId).integer().not_null())
            .col(ColumnDef::new(WorkOrders::EndClientId).integer().not_null())
            .col(ColumnDef::new(WorkOrders::WoDate).date().not_null())
            .col(ColumnDef::new(WorkOrders::WoValidate).date().not_null())
            .col(
                ColumnDef::new(WorkOrders::TotalValue)
                    .decimal_len(16, 4)
                    .not_null(),
            )
            .col(ColumnDef::new(WorkOrders::ContactPerson).string().not_null())
            .col(ColumnDef::new(WorkOrders::ContactEmail).string().not_null())
            .col(ColumnDef::new(WorkOrders::ContactNumber).string().not_null())
            .col(ColumnDef::new(WorkOrders::BillingAddress).text().not_null())
            .col(ColumnDef::new(WorkOrders::ShippingAddress).text().not_null())
            .col(ColumnDef::new(WorkOrders::PaymentTerm).json().not_null())
            .col(ColumnDef::new(WorkOrders::RecurrencePatterns).json().null())
            .col(ColumnDef::new(WorkOrders::Comments).text().null());
    }

    /// Columns shared by the live material table and its revision table.
    fn material_payload(table: &mut TableCreateStatement) {
        table
            .col(ColumnDef::new(Materials::ItemName).string().not_null())
            .col(ColumnDef::new(Materials::HsnCode).string().not_null())
            .col(ColumnDef::new(Materials::UnitRate).decimal_len(16, 4).not_null())
            .col(ColumnDef::new(Materials::Volume).decimal_len(16, 4).not_null())
            .col(
                ColumnDef::new(Materials::VolumeUsed)
                    .decimal_len(16, 4)
                    .not_null(),
            )
            .col(ColumnDef::new(Materials::Tax).decimal_len(8, 4).not_null())
            .col(ColumnDef::new(Materials::TowerId).integer().null())
            .col(ColumnDef::new(Materials::FloorIds).json().not_null())
            .col(
                ColumnDef::new(Materials::CreatedAt)
                    .timestamp_with_time_zone()
                    .not_null(),
            );
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            let mut work_orders = Table::create();
            work_orders
                .table(WorkOrders::Table)
                .if_not_exists()
                .col(&mut pk(WorkOrders::Id));
            work_order_payload(&mut work_orders);
            work_orders
                .col(ColumnDef::new(WorkOrders::CreatedBy).integer().not_null())
                .col(
                    ColumnDef::new(WorkOrders::CreatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(WorkOrders::UpdatedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                );
            manager.create_table(work_orders).await?;

            let mut materials = Table::create();
            materials
                .table(WorkOrderMaterials::Table)
                .if_not_exists()
                .col(&mut pk(Materials::Id))
                .col(ColumnDef::new(Materials::WorkOrderId).integer().not_null());
            material_payload(&mut materials);
            materials.foreign_key(
                ForeignKey::create()
                    .name("fk_work_order_materials_work_order_id")
                    .from(WorkOrderMaterials::Table, Materials::WorkOrderId)
                    .to(WorkOrders::Table, WorkOrders::Id)
                    .on_delete(ForeignKeyAction::Cascade),
            );
            manager.create_table(materials).await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderAttachments::Table)
                        .if_not_exists()
                        .col(&mut pk(Attachments::Id))
                        .col(ColumnDef::new(Attachments::WorkOrderId).integer().not_null())
                        .col(ColumnDef::new(Attachments::FileUrl).text().not_null())
                        .col(
                            ColumnDef::new(Attachments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_order_attachments_work_order_id")
                                .from(WorkOrderAttachments::Table, Attachments::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            let mut revisions = Table::create();
            revisions
                .table(WorkOrderRevisions::Table)
                .if_not_exists()
                .col(&mut pk(WorkOrderRevisions::Id))
                .col(
                    ColumnDef::new(WorkOrderRevisions::WorkOrderId)
                        .integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(WorkOrderRevisions::RevisionNo)
                        .integer()
                        .not_null(),
                );
            work_order_payload(&mut revisions);
            revisions
                .col(
                    ColumnDef::new(WorkOrderRevisions::RevisedBy)
                        .integer()
                        .not_null(),
                )
                .col(
                    ColumnDef::new(WorkOrderRevisions::RevisedAt)
                        .timestamp_with_time_zone()
                        .not_null(),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_work_order_revisions_work_order_id")
                        .from(WorkOrderRevisions::Table, WorkOrderRevisions::WorkOrderId)
                        .to(WorkOrders::Table, WorkOrders::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                );
            manager.create_table(revisions).await?;

            let mut material_revisions = Table::create();
            material_revisions
                .table(WorkOrderMaterialRevisions::Table)
                .if_not_exists()
                .col(&mut pk(Materials::Id))
                .col(
                    ColumnDef::new(WorkOrderMaterialRevisions::WorkOrderRevisionId)
                        .integer()
                        .not_null(),
                )
                .col(ColumnDef::new(Materials::WorkOrderId).integer().not_null())
                .col(
                    ColumnDef::new(WorkOrderMaterialRevisions::MaterialId)
                        .integer()
                        .not_null(),
                );
            material_payload(&mut material_revisions);
            material_revisions
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_material_revisions_revision_id")
                        .from(
                            WorkOrderMaterialRevisions::Table,
                            WorkOrderMaterialRevisions::WorkOrderRevisionId,
                        )
                        .to(WorkOrderRevisions::Table, WorkOrderRevisions::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                )
                .foreign_key(
                    ForeignKey::create()
                        .name("fk_material_revisions_work_order_id")
                        .from(WorkOrderMaterialRevisions::Table, Materials::WorkOrderId)
                        .to(WorkOrders::Table, WorkOrders::Id)
                        .on_delete(ForeignKeyAction::Cascade),
                );
            manager.create_table(material_revisions).await?;

            manager
                .create_table(
                    Table::create()
                        .table(WorkOrderAttachmentRevisions::Table)
                        .if_not_exists()
                        .col(&mut pk(Attachments::Id))
                        .col(
                            ColumnDef::new(WorkOrderAttachmentRevisions::WorkOrderRevisionId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Attachments::WorkOrderId).integer().not_null())
                        .col(ColumnDef::new(Attachments::FileUrl).text().not_null())
                        .col(
                            ColumnDef::new(Attachments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attachment_revisions_revision_id")
                                .from(
                                    WorkOrderAttachmentRevisions::Table,
                                    WorkOrderAttachmentRevisions::WorkOrderRevisionId,
                                )
                                .to(WorkOrderRevisions::Table, WorkOrderRevisions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_attachment_revisions_work_order_id")
                                .from(WorkOrderAttachmentRevisions::Table, Attachments::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(&mut pk(Invoices::Id))
                        .col(ColumnDef::new(Invoices::WorkOrderId).integer().not_null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Invoices::Indraft)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Invoices::TotalAmount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::CreatedBy).integer().not_null())
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoices_work_order_id")
                                .from(Invoices::Table, Invoices::WorkOrderId)
                                .to(WorkOrders::Table, WorkOrders::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InvoiceItems::Table)
                        .if_not_exists()
                        .col(&mut pk(InvoiceItems::Id))
                        .col(ColumnDef::new(InvoiceItems::InvoiceId).integer().not_null())
                        .col(
                            ColumnDef::new(InvoiceItems::WorkOrderMaterialId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::Volume)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::Amount)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InvoiceItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_invoice_items_invoice_id")
                                .from(InvoiceItems::Table, InvoiceItems::InvoiceId)
                                .to(Invoices::Table, Invoices::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(index(
                    "idx_work_orders_wo_number",
                    WorkOrders::Table,
                    WorkOrders::WoNumber,
                ))
                .await?;
            manager
                .create_index(index(
                    "idx_work_order_materials_work_order_id",
                    WorkOrderMaterials::Table,
                    Materials::WorkOrderId,
                ))
                .await?;
            manager
                .create_index(
                    Index::create()
                        .name("idx_work_order_revisions_unique_no")
                        .table(WorkOrderRevisions::Table)
                        .col(WorkOrderRevisions::WorkOrderId)
                        .col(WorkOrderRevisions::RevisionNo)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
            manager
                .create_index(index(
                    "idx_invoices_work_order_id",
                    Invoices::Table,
                    Invoices::WorkOrderId,
                ))
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            for table in [
                InvoiceItems::Table.into_iden(),
                Invoices::Table.into_iden(),
                WorkOrderAttachmentRevisions::Table.into_iden(),
                WorkOrderMaterialRevisions::Table.into_iden(),
                WorkOrderRevisions::Table.into_iden(),
                WorkOrderAttachments::Table.into_iden(),
                WorkOrderMaterials::Table.into_iden(),
                WorkOrders::Table.into_iden(),
            ] {
                manager
                    .drop_table(Table::drop().table(table).to_owned())
                    .await?;
            }
            Ok(())
        }
    }

    #[derive(Iden)]
    enum WorkOrders {
        Table,
        Id,
        WoNumber,
        Revision,
        ProjectId,
        EndClientId,
        WoDate,
        WoValidate,
        TotalValue,
        ContactPerson,
        ContactEmail,
        ContactNumber,
        BillingAddress,
        ShippingAddress,
        PaymentTerm,
        RecurrencePatterns,
        Comments,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum WorkOrderRevisions {
        Table,
        Id,
        WorkOrderId,
        RevisionNo,
        RevisedBy,
        RevisedAt,
    }

    #[derive(Iden)]
    enum WorkOrderMaterials {
        Table,
    }

    #[derive(Iden)]
    enum WorkOrderMaterialRevisions {
        Table,
        WorkOrderRevisionId,
        MaterialId,
    }

    /// Column names shared by live and revision material tables
    #[derive(Iden)]
    enum Materials {
        Id,
        WorkOrderId,
        ItemName,
        HsnCode,
        UnitRate,
        Volume,
        VolumeUsed,
        Tax,
        TowerId,
        FloorIds,
        CreatedAt,
    }

    #[derive(Iden)]
    enum WorkOrderAttachments {
        Table,
    }

    #[derive(Iden)]
    enum WorkOrderAttachmentRevisions {
        Table,
        WorkOrderRevisionId,
    }

    /// Column names shared by live and revision attachment tables
    #[derive(Iden)]
    enum Attachments {
        Id,
        WorkOrderId,
        FileUrl,
        CreatedAt,
    }

    #[derive(Iden)]
    enum Invoices {
        Table,
        Id,
        WorkOrderId,
        InvoiceNumber,
        Indraft,
        TotalAmount,
        CreatedBy,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum InvoiceItems {
        Table,
        Id,
        InvoiceId,
        WorkOrderMaterialId,
        Volume,
        Amount,
        CreatedAt,
    }
}
