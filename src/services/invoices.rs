use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AccessPolicy, Session};
use crate::db::{self, DbPool};
use crate::entities::{end_client, invoice, invoice_item, work_order, work_order_material};
use crate::errors::ServiceError;
use crate::events::{Event, EventKind, EventSender};

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct InvoiceLineInput {
    pub work_order_material_id: i32,
    pub volume: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInvoiceRequest {
    pub work_order_id: i32,
    #[validate(length(min = 1, message = "an invoice needs at least one item"))]
    pub items: Vec<InvoiceLineInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceItemView {
    pub id: i32,
    pub work_order_material_id: i32,
    pub volume: Decimal,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InvoiceView {
    pub id: i32,
    pub work_order_id: i32,
    pub invoice_number: String,
    pub indraft: bool,
    pub total_amount: Decimal,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub items: Vec<InvoiceItemView>,
}

/// An invoice line with the remaining balance of its material.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingInvoiceLine {
    pub id: i32,
    pub work_order_material_id: i32,
    pub item_name: String,
    pub unit_rate: Decimal,
    pub volume: Decimal,
    pub amount: Decimal,
    pub material_volume: Decimal,
    pub volume_used: Decimal,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PendingInvoiceView {
    pub id: i32,
    pub invoice_number: String,
    pub work_order_id: i32,
    pub wo_number: String,
    pub project_id: i32,
    pub end_client_id: i32,
    pub end_client_name: String,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PendingInvoiceLine>,
}

/// Service for draft invoices raised against work orders
#[derive(Clone)]
pub struct InvoiceService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl InvoiceService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a draft invoice, consuming each line's volume from its
    /// work-order material.
    ///
    /// # Errors
    /// `ValidationError` if any line would take a material past its volume;
    /// nothing is consumed in that case.
    #[instrument(skip(self, request, session), fields(actor = session.user_id, work_order_id = request.work_order_id))]
    pub async fn create_invoice_draft(
        &self,
        request: CreateInvoiceRequest,
        session: &Session,
    ) -> Result<InvoiceView, ServiceError> {
        request.validate()?;
        if let Some(line) = request.items.iter().find(|l| l.volume <= Decimal::ZERO) {
            return Err(ServiceError::ValidationError(format!(
                "Volume for material {} must be positive",
                line.work_order_material_id
            )));
        }

        let txn = db::begin(&self.db_pool).await?;
        let order = work_order::Entity::find_by_id(request.work_order_id)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Work order {} not found", request.work_order_id))
            })?;

        let materials: HashMap<i32, work_order_material::Model> =
            work_order_material::Entity::find()
                .filter(work_order_material::Column::WorkOrderId.eq(order.id))
                .all(&txn)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

        let mut priced = Vec::with_capacity(request.items.len());
        for line in &request.items {
            let material = materials.get(&line.work_order_material_id).ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Material {} not found on work order {}",
                    line.work_order_material_id, order.id
                ))
            })?;

            let consumed = work_order_material::Entity::update_many()
                .col_expr(
                    work_order_material::Column::VolumeUsed,
                    Expr::col(work_order_material::Column::VolumeUsed).add(line.volume),
                )
                .filter(work_order_material::Column::Id.eq(material.id))
                .filter(
                    Expr::expr(Expr::col(work_order_material::Column::VolumeUsed).add(line.volume))
                        .lte(Expr::col(work_order_material::Column::Volume)),
                )
                .exec(&txn)
                .await
                .map_err(ServiceError::db_error)?;
            if consumed.rows_affected != 1 {
                return Err(ServiceError::ValidationError(format!(
                    "Volume {} exceeds the remaining balance of material {}",
                    line.volume, material.id
                )));
            }
            priced.push((line, line.volume * material.unit_rate));
        }

        let sequence = invoice::Entity::find()
            .filter(invoice::Column::WorkOrderId.eq(order.id))
            .count(&txn)
            .await
            .map_err(ServiceError::db_error)?
            + 1;
        let now = Utc::now();
        let total_amount: Decimal = priced.iter().map(|(_, amount)| *amount).sum();

        let created = invoice::ActiveModel {
            work_order_id: Set(order.id),
            invoice_number: Set(format!("INV-{}-{}", order.wo_number, sequence)),
            indraft: Set(true),
            total_amount: Set(total_amount),
            created_by: Set(session.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
                "Invoice number for work order {} is already taken, retry",
                order.id
            )),
            _ => ServiceError::db_error(e),
        })?;

        let mut items = Vec::with_capacity(priced.len());
        for (line, amount) in priced {
            let item = invoice_item::ActiveModel {
                invoice_id: Set(created.id),
                work_order_material_id: Set(line.work_order_material_id),
                volume: Set(line.volume),
                amount: Set(amount),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
            items.push(item_view(item));
        }

        db::commit(txn, "create_invoice_draft").await?;

        info!(invoice_id = created.id, invoice_number = %created.invoice_number, "Invoice draft created");
        self.event_sender.emit(
            Event::new(
                EventKind::InvoiceDraftCreated,
                session.user_id,
                json!({ "invoice_id": created.id, "work_order_id": order.id }),
            )
            .in_project(order.project_id),
        );

        Ok(invoice_view(created, items))
    }

    /// Takes an invoice out of draft. Finalising twice is an invalid
    /// transition.
    #[instrument(skip(self, session), fields(actor = session.user_id))]
    pub async fn finalize_invoice(
        &self,
        invoice_id: i32,
        session: &Session,
    ) -> Result<InvoiceView, ServiceError> {
        let db = &*self.db_pool;
        let flipped = invoice::Entity::update_many()
            .col_expr(invoice::Column::Indraft, Expr::value(false))
            .col_expr(invoice::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(invoice::Column::Id.eq(invoice_id))
            .filter(invoice::Column::Indraft.eq(true))
            .exec(db)
            .await
            .map_err(ServiceError::db_error)?;

        let found = invoice::Entity::find_by_id(invoice_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| ServiceError::NotFound(format!("Invoice {} not found", invoice_id)))?;
        if flipped.rows_affected == 0 {
            warn!(invoice_id, "Invoice already finalised");
            return Err(ServiceError::InvalidTransition(format!(
                "Invoice {} is already finalised",
                invoice_id
            )));
        }

        let items = invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
            .order_by_asc(invoice_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(item_view)
            .collect();

        info!(invoice_id, "Invoice finalised");
        self.event_sender.emit(Event::new(
            EventKind::InvoiceFinalized,
            session.user_id,
            json!({ "invoice_id": invoice_id, "invoice_number": found.invoice_number }),
        ));

        Ok(invoice_view(found, items))
    }

    /// Draft invoices visible to the caller, each line showing what is left
    /// of its material.
    #[instrument(skip(self, session), fields(actor = session.user_id, role = %session.role))]
    pub async fn list_pending_invoices(
        &self,
        session: &Session,
    ) -> Result<Vec<PendingInvoiceView>, ServiceError> {
        let visibility = AccessPolicy::for_session(session).invoice_visibility()?;
        let db = &*self.db_pool;

        let invoices = invoice::Entity::find()
            .join(JoinType::InnerJoin, invoice::Relation::WorkOrder.def())
            .join(JoinType::InnerJoin, work_order::Relation::EndClient.def())
            .filter(invoice::Column::Indraft.eq(true))
            .filter(visibility)
            .order_by_asc(invoice::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        if invoices.is_empty() {
            return Ok(Vec::new());
        }

        let work_order_ids: Vec<i32> = invoices.iter().map(|i| i.work_order_id).collect();
        let orders: HashMap<i32, work_order::Model> = work_order::Entity::find()
            .filter(work_order::Column::Id.is_in(work_order_ids.clone()))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|o| (o.id, o))
            .collect();
        let clients: HashMap<i32, end_client::Model> = end_client::Entity::find()
            .filter(end_client::Column::Id.is_in(orders.values().map(|o| o.end_client_id)))
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let materials: HashMap<i32, work_order_material::Model> =
            work_order_material::Entity::find()
                .filter(work_order_material::Column::WorkOrderId.is_in(work_order_ids))
                .all(db)
                .await
                .map_err(ServiceError::db_error)?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

        let mut lines: HashMap<i32, Vec<PendingInvoiceLine>> = HashMap::new();
        for item in invoice_item::Entity::find()
            .filter(invoice_item::Column::InvoiceId.is_in(invoices.iter().map(|i| i.id)))
            .order_by_asc(invoice_item::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
        {
            let material = materials.get(&item.work_order_material_id);
            lines.entry(item.invoice_id).or_default().push(PendingInvoiceLine {
                id: item.id,
                work_order_material_id: item.work_order_material_id,
                item_name: material.map(|m| m.item_name.clone()).unwrap_or_default(),
                unit_rate: material.map(|m| m.unit_rate).unwrap_or_default(),
                volume: item.volume,
                amount: item.amount,
                material_volume: material.map(|m| m.volume).unwrap_or_default(),
                volume_used: material.map(|m| m.volume_used).unwrap_or_default(),
                balance: material.map(|m| m.balance()).unwrap_or_default(),
            });
        }

        let mut pending = Vec::with_capacity(invoices.len());
        for inv in invoices {
            let Some(order) = orders.get(&inv.work_order_id) else {
                continue;
            };
            pending.push(PendingInvoiceView {
                items: lines.remove(&inv.id).unwrap_or_default(),
                id: inv.id,
                invoice_number: inv.invoice_number,
                work_order_id: order.id,
                wo_number: order.wo_number.clone(),
                project_id: order.project_id,
                end_client_id: order.end_client_id,
                end_client_name: clients
                    .get(&order.end_client_id)
                    .map(|c| c.name.clone())
                    .unwrap_or_default(),
                total_amount: inv.total_amount,
                created_at: inv.created_at,
            });
        }
        Ok(pending)
    }
}

fn item_view(item: invoice_item::Model) -> InvoiceItemView {
    InvoiceItemView {
        id: item.id,
        work_order_material_id: item.work_order_material_id,
        volume: item.volume,
        amount: item.amount,
    }
}

fn invoice_view(model: invoice::Model, items: Vec<InvoiceItemView>) -> InvoiceView {
    InvoiceView {
        id: model.id,
        work_order_id: model.work_order_id,
        invoice_number: model.invoice_number,
        indraft: model.indraft,
        total_amount: model.total_amount,
        created_by: model.created_by,
        created_at: model.created_at,
        items,
    }
}
