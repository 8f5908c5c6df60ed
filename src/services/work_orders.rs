use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::auth::Session;
use crate::db::{self, DbPool};
use crate::entities::{
    end_client, work_order, work_order_attachment, work_order_attachment_revision,
    work_order_material, work_order_material_revision, work_order_revision,
};
use crate::errors::ServiceError;
use crate::events::{Event, EventKind, EventSender};
use crate::models::PaymentTerm;
use crate::services::{FloorRef, PrecastHierarchy};

const MAX_TAX_PERCENT: Decimal = Decimal::ONE_HUNDRED;

/// A material line. `id` names an existing line on update; omit it for a
/// new line.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct MaterialInput {
    pub id: Option<i32>,
    #[validate(length(min = 1, max = 255))]
    pub item_name: String,
    #[validate(length(max = 32))]
    pub hsn_code: String,
    pub unit_rate: Decimal,
    pub volume: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    pub tower_id: Option<i32>,
    #[serde(default)]
    pub floor_ids: Vec<i32>,
}

impl MaterialInput {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.unit_rate.is_sign_negative() || self.volume.is_sign_negative() {
            return Err(ServiceError::ValidationError(format!(
                "Material '{}' must have a non-negative unit rate and volume",
                self.item_name
            )));
        }
        if self.tax.is_sign_negative() || self.tax > MAX_TAX_PERCENT {
            return Err(ServiceError::ValidationError(format!(
                "Material '{}' tax must be between 0 and 100",
                self.item_name
            )));
        }
        Ok(())
    }
}

/// Body of both create and update.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct WorkOrderPayload {
    #[validate(length(min = 1, max = 64))]
    pub wo_number: String,
    #[validate(range(min = 1))]
    pub project_id: i32,
    pub end_client_id: i32,
    pub wo_date: NaiveDate,
    pub wo_validate: NaiveDate,
    pub total_value: Decimal,
    #[validate(length(min = 1))]
    pub contact_person: String,
    #[validate(email)]
    pub contact_email: String,
    #[validate(length(min = 1, max = 32))]
    pub contact_number: String,
    #[serde(default)]
    pub billing_address: String,
    #[serde(default)]
    pub shipping_address: String,
    #[serde(default)]
    pub payment_term: PaymentTerm,
    pub recurrence_patterns: Option<Vec<serde_json::Value>>,
    pub comments: Option<String>,
    #[serde(default)]
    pub materials: Vec<MaterialInput>,
    #[serde(default)]
    pub attachments: Vec<String>,
}

impl WorkOrderPayload {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.wo_validate < self.wo_date {
            return Err(ServiceError::ValidationError(
                "wo_validate must not be before wo_date".to_string(),
            ));
        }
        if self.total_value.is_sign_negative() {
            return Err(ServiceError::ValidationError(
                "total_value must not be negative".to_string(),
            ));
        }
        self.payment_term
            .check()
            .map_err(ServiceError::ValidationError)?;
        if self.attachments.iter().any(|url| url.trim().is_empty()) {
            return Err(ServiceError::ValidationError(
                "attachment urls must not be blank".to_string(),
            ));
        }
        for material in &self.materials {
            material.check()?;
        }
        Ok(())
    }

    fn recurrence_json(&self) -> Option<serde_json::Value> {
        self.recurrence_patterns
            .as_ref()
            .map(|patterns| serde_json::Value::Array(patterns.clone()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MaterialView {
    pub id: i32,
    pub item_name: String,
    pub hsn_code: String,
    pub unit_rate: Decimal,
    pub volume: Decimal,
    pub volume_used: Decimal,
    pub balance: Decimal,
    pub tax: Decimal,
    pub tower_id: Option<i32>,
    pub tower_name: String,
    pub floors: Vec<FloorRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttachmentView {
    pub id: i32,
    pub file_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkOrderView {
    pub id: i32,
    pub wo_number: String,
    pub revision: i32,
    pub project_id: i32,
    pub end_client_id: i32,
    pub wo_date: NaiveDate,
    pub wo_validate: NaiveDate,
    pub total_value: Decimal,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_number: String,
    pub billing_address: String,
    pub shipping_address: String,
    pub payment_term: PaymentTerm,
    pub recurrence_patterns: Option<serde_json::Value>,
    pub comments: Option<String>,
    pub created_by: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub materials: Vec<MaterialView>,
    pub attachments: Vec<AttachmentView>,
}

/// A frozen copy of a work order as it was before one update.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RevisionView {
    pub id: i32,
    pub work_order_id: i32,
    pub revision_no: i32,
    pub wo_number: String,
    pub revision: i32,
    pub wo_date: NaiveDate,
    pub wo_validate: NaiveDate,
    pub total_value: Decimal,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_number: String,
    pub billing_address: String,
    pub shipping_address: String,
    pub payment_term: PaymentTerm,
    pub recurrence_patterns: Option<serde_json::Value>,
    pub comments: Option<String>,
    pub revised_by: i32,
    pub revised_at: DateTime<Utc>,
    pub materials: Vec<MaterialView>,
    pub attachments: Vec<AttachmentView>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct WorkOrderFilter {
    pub project_id: Option<i32>,
}

/// Service for work orders and their revision history
#[derive(Clone)]
pub struct WorkOrderService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
}

impl WorkOrderService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a work order. Its `revision` continues from the highest
    /// revision already stored under the same `wo_number`, or starts at 0.
    #[instrument(skip(self, payload, session), fields(actor = session.user_id, wo_number = %payload.wo_number))]
    pub async fn create(
        &self,
        payload: WorkOrderPayload,
        session: &Session,
    ) -> Result<WorkOrderView, ServiceError> {
        payload.check()?;
        if let Some(material) = payload.materials.iter().find(|m| m.id.is_some()) {
            return Err(ServiceError::ValidationError(format!(
                "Material '{}' must not carry an id on create",
                material.item_name
            )));
        }

        let txn = db::begin(&self.db_pool).await?;
        ensure_end_client(&txn, payload.end_client_id).await?;

        let revision = work_order::Entity::find()
            .filter(work_order::Column::WoNumber.eq(payload.wo_number.as_str()))
            .order_by_desc(work_order::Column::Revision)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .map(|previous| previous.revision + 1)
            .unwrap_or(0);

        let now = Utc::now();
        let order = work_order::ActiveModel {
            wo_number: Set(payload.wo_number.clone()),
            revision: Set(revision),
            project_id: Set(payload.project_id),
            end_client_id: Set(payload.end_client_id),
            wo_date: Set(payload.wo_date),
            wo_validate: Set(payload.wo_validate),
            total_value: Set(payload.total_value),
            contact_person: Set(payload.contact_person.clone()),
            contact_email: Set(payload.contact_email.clone()),
            contact_number: Set(payload.contact_number.clone()),
            billing_address: Set(payload.billing_address.clone()),
            shipping_address: Set(payload.shipping_address.clone()),
            payment_term: Set(payload.payment_term.to_json()),
            recurrence_patterns: Set(payload.recurrence_json()),
            comments: Set(payload.comments.clone()),
            created_by: Set(session.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;

        for material in &payload.materials {
            insert_material(&txn, order.id, material, None, Decimal::ZERO).await?;
        }
        insert_attachments(&txn, order.id, &payload.attachments).await?;

        db::commit(txn, "create_work_order").await?;

        info!(work_order_id = order.id, revision, "Work order created");
        self.event_sender.emit(
            Event::new(
                EventKind::WorkOrderCreated,
                session.user_id,
                json!({ "work_order_id": order.id, "wo_number": order.wo_number }),
            )
            .in_project(order.project_id),
        );

        self.get(order.id).await
    }

    /// Snapshots the live work order with its materials and attachments into
    /// the revision tables, then overwrites it with `payload`.
    ///
    /// Materials named by `id` keep their id and consumed volume; lines left
    /// out of the payload are removed unless invoices already consumed them.
    #[instrument(skip(self, payload, session), fields(actor = session.user_id))]
    pub async fn update(
        &self,
        work_order_id: i32,
        payload: WorkOrderPayload,
        session: &Session,
    ) -> Result<WorkOrderView, ServiceError> {
        payload.check()?;

        let txn = db::begin(&self.db_pool).await?;
        let mut live = work_order::Entity::find_by_id(work_order_id);
        // updates of one order take turns from here; SQLite has no row locks
        if txn.get_database_backend() == DbBackend::Postgres {
            live = live.lock_exclusive();
        }
        let current = live
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Work order {} not found", work_order_id))
            })?;
        ensure_end_client(&txn, payload.end_client_id).await?;

        let materials = work_order_material::Entity::find()
            .filter(work_order_material::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_material::Column::Id)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        let attachments = work_order_attachment::Entity::find()
            .filter(work_order_attachment::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_attachment::Column::Id)
            .all(&txn)
            .await
            .map_err(ServiceError::db_error)?;

        let carried = plan_material_carry_over(&materials, &payload.materials)?;

        let revision_no = work_order_revision::Entity::find()
            .filter(work_order_revision::Column::WorkOrderId.eq(work_order_id))
            .order_by_desc(work_order_revision::Column::RevisionNo)
            .one(&txn)
            .await
            .map_err(ServiceError::db_error)?
            .map(|latest| latest.revision_no + 1)
            .unwrap_or(1);

        let now = Utc::now();
        let snapshot = snapshot_work_order(&txn, &current, revision_no, session.user_id, now).await?;
        for material in &materials {
            work_order_material_revision::ActiveModel {
                work_order_revision_id: Set(snapshot.id),
                work_order_id: Set(work_order_id),
                material_id: Set(material.id),
                item_name: Set(material.item_name.clone()),
                hsn_code: Set(material.hsn_code.clone()),
                unit_rate: Set(material.unit_rate),
                volume: Set(material.volume),
                volume_used: Set(material.volume_used),
                tax: Set(material.tax),
                tower_id: Set(material.tower_id),
                floor_ids: Set(material.floor_ids.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        }
        for attachment in &attachments {
            work_order_attachment_revision::ActiveModel {
                work_order_revision_id: Set(snapshot.id),
                work_order_id: Set(work_order_id),
                file_url: Set(attachment.file_url.clone()),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        }

        let mut live: work_order::ActiveModel = current.into();
        live.wo_number = Set(payload.wo_number.clone());
        live.revision = Set(revision_no);
        live.project_id = Set(payload.project_id);
        live.end_client_id = Set(payload.end_client_id);
        live.wo_date = Set(payload.wo_date);
        live.wo_validate = Set(payload.wo_validate);
        live.total_value = Set(payload.total_value);
        live.contact_person = Set(payload.contact_person.clone());
        live.contact_email = Set(payload.contact_email.clone());
        live.contact_number = Set(payload.contact_number.clone());
        live.billing_address = Set(payload.billing_address.clone());
        live.shipping_address = Set(payload.shipping_address.clone());
        live.payment_term = Set(payload.payment_term.to_json());
        live.recurrence_patterns = Set(payload.recurrence_json());
        live.comments = Set(payload.comments.clone());
        live.updated_at = Set(now);
        let live = live.update(&txn).await.map_err(ServiceError::db_error)?;

        work_order_material::Entity::delete_many()
            .filter(work_order_material::Column::WorkOrderId.eq(work_order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        for (material, used) in payload.materials.iter().zip(carried) {
            insert_material(&txn, work_order_id, material, material.id, used).await?;
        }

        work_order_attachment::Entity::delete_many()
            .filter(work_order_attachment::Column::WorkOrderId.eq(work_order_id))
            .exec(&txn)
            .await
            .map_err(ServiceError::db_error)?;
        insert_attachments(&txn, work_order_id, &payload.attachments).await?;

        db::commit(txn, "update_work_order").await?;

        info!(work_order_id, revision_no, "Work order revised");
        self.event_sender.emit(
            Event::new(
                EventKind::WorkOrderRevised,
                session.user_id,
                json!({ "work_order_id": work_order_id, "revision_no": revision_no }),
            )
            .in_project(live.project_id),
        );

        self.get(work_order_id).await
    }

    #[instrument(skip(self))]
    pub async fn get(&self, work_order_id: i32) -> Result<WorkOrderView, ServiceError> {
        let db = &*self.db_pool;
        let order = work_order::Entity::find_by_id(work_order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Work order {} not found", work_order_id))
            })?;

        let hierarchy = PrecastHierarchy::load(db, order.project_id).await?;
        let materials = work_order_material::Entity::find()
            .filter(work_order_material::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_material::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let attachments = work_order_attachment::Entity::find()
            .filter(work_order_attachment::Column::WorkOrderId.eq(work_order_id))
            .order_by_asc(work_order_attachment::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;

        work_order_view(
            order,
            materials
                .iter()
                .map(|m| live_material_view(m, &hierarchy))
                .collect(),
            attachments
                .into_iter()
                .map(|a| AttachmentView {
                    id: a.id,
                    file_url: a.file_url,
                })
                .collect(),
        )
    }

    /// Lists live work orders without their child rows.
    #[instrument(skip(self))]
    pub async fn list(&self, filter: WorkOrderFilter) -> Result<Vec<WorkOrderView>, ServiceError> {
        let mut query = work_order::Entity::find();
        if let Some(project_id) = filter.project_id {
            query = query.filter(work_order::Column::ProjectId.eq(project_id));
        }
        query
            .order_by_asc(work_order::Column::Id)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?
            .into_iter()
            .map(|order| work_order_view(order, Vec::new(), Vec::new()))
            .collect()
    }

    /// Revision history, newest first.
    #[instrument(skip(self))]
    pub async fn list_revisions(&self, work_order_id: i32) -> Result<Vec<RevisionView>, ServiceError> {
        let db = &*self.db_pool;
        let order = work_order::Entity::find_by_id(work_order_id)
            .one(db)
            .await
            .map_err(ServiceError::db_error)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Work order {} not found", work_order_id))
            })?;
        let hierarchy = PrecastHierarchy::load(db, order.project_id).await?;

        let revisions = work_order_revision::Entity::find()
            .filter(work_order_revision::Column::WorkOrderId.eq(work_order_id))
            .order_by_desc(work_order_revision::Column::RevisionNo)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?;
        let revision_ids: Vec<i32> = revisions.iter().map(|r| r.id).collect();

        let mut materials: HashMap<i32, Vec<MaterialView>> = HashMap::new();
        for material in work_order_material_revision::Entity::find()
            .filter(work_order_material_revision::Column::WorkOrderRevisionId.is_in(revision_ids.clone()))
            .order_by_asc(work_order_material_revision::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
        {
            materials
                .entry(material.work_order_revision_id)
                .or_default()
                .push(revised_material_view(&material, &hierarchy));
        }

        let mut attachments: HashMap<i32, Vec<AttachmentView>> = HashMap::new();
        for attachment in work_order_attachment_revision::Entity::find()
            .filter(work_order_attachment_revision::Column::WorkOrderRevisionId.is_in(revision_ids))
            .order_by_asc(work_order_attachment_revision::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::db_error)?
        {
            attachments
                .entry(attachment.work_order_revision_id)
                .or_default()
                .push(AttachmentView {
                    id: attachment.id,
                    file_url: attachment.file_url,
                });
        }

        revisions
            .into_iter()
            .map(|revision| {
                Ok::<_, ServiceError>(RevisionView {
                    payment_term: PaymentTerm::from_json(&revision.payment_term)?,
                    materials: materials.remove(&revision.id).unwrap_or_default(),
                    attachments: attachments.remove(&revision.id).unwrap_or_default(),
                    id: revision.id,
                    work_order_id: revision.work_order_id,
                    revision_no: revision.revision_no,
                    wo_number: revision.wo_number,
                    revision: revision.revision,
                    wo_date: revision.wo_date,
                    wo_validate: revision.wo_validate,
                    total_value: revision.total_value,
                    contact_person: revision.contact_person,
                    contact_email: revision.contact_email,
                    contact_number: revision.contact_number,
                    billing_address: revision.billing_address,
                    shipping_address: revision.shipping_address,
                    recurrence_patterns: revision.recurrence_patterns,
                    comments: revision.comments,
                    revised_by: revision.revised_by,
                    revised_at: revision.revised_at,
                })
            })
            .collect()
    }
}

/// Consumed volume each payload material carries over, in payload order.
pub(crate) fn plan_material_carry_over(
    existing: &[work_order_material::Model],
    incoming: &[MaterialInput],
) -> Result<Vec<Decimal>, ServiceError> {
    let by_id: HashMap<i32, &work_order_material::Model> =
        existing.iter().map(|m| (m.id, m)).collect();

    let mut kept = Vec::new();
    let mut carried = Vec::with_capacity(incoming.len());
    for material in incoming {
        let Some(id) = material.id else {
            carried.push(Decimal::ZERO);
            continue;
        };
        let current = by_id.get(&id).ok_or_else(|| {
            ServiceError::ValidationError(format!(
                "Material {} does not belong to this work order",
                id
            ))
        })?;
        if kept.contains(&id) {
            return Err(ServiceError::ValidationError(format!(
                "Material {} appears more than once",
                id
            )));
        }
        if material.volume < current.volume_used {
            return Err(ServiceError::ValidationError(format!(
                "Material {} volume {} is below the {} already invoiced",
                id, material.volume, current.volume_used
            )));
        }
        kept.push(id);
        carried.push(current.volume_used);
    }

    if let Some(dropped) = existing
        .iter()
        .find(|m| !kept.contains(&m.id) && !m.volume_used.is_zero())
    {
        return Err(ServiceError::ValidationError(format!(
            "Material {} has been invoiced and cannot be removed",
            dropped.id
        )));
    }

    Ok(carried)
}

async fn ensure_end_client(txn: &DatabaseTransaction, end_client_id: i32) -> Result<(), ServiceError> {
    end_client::Entity::find_by_id(end_client_id)
        .one(txn)
        .await
        .map_err(ServiceError::db_error)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::NotFound(format!("End client {} not found", end_client_id)))
}

async fn snapshot_work_order(
    txn: &DatabaseTransaction,
    current: &work_order::Model,
    revision_no: i32,
    revised_by: i32,
    revised_at: DateTime<Utc>,
) -> Result<work_order_revision::Model, ServiceError> {
    work_order_revision::ActiveModel {
        work_order_id: Set(current.id),
        revision_no: Set(revision_no),
        wo_number: Set(current.wo_number.clone()),
        revision: Set(current.revision),
        project_id: Set(current.project_id),
        end_client_id: Set(current.end_client_id),
        wo_date: Set(current.wo_date),
        wo_validate: Set(current.wo_validate),
        total_value: Set(current.total_value),
        contact_person: Set(current.contact_person.clone()),
        contact_email: Set(current.contact_email.clone()),
        contact_number: Set(current.contact_number.clone()),
        billing_address: Set(current.billing_address.clone()),
        shipping_address: Set(current.shipping_address.clone()),
        payment_term: Set(current.payment_term.clone()),
        recurrence_patterns: Set(current.recurrence_patterns.clone()),
        comments: Set(current.comments.clone()),
        revised_by: Set(revised_by),
        revised_at: Set(revised_at),
        ..Default::default()
    }
    .insert(txn)
    .await
    .map_err(|err| revision_insert_error(err, current.id, revision_no))
}

/// A revision number taken by a concurrent update becomes a conflict.
fn revision_insert_error(err: DbErr, work_order_id: i32, revision_no: i32) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::Conflict(format!(
            "Revision {} of work order {} was written concurrently; retry the update",
            revision_no, work_order_id
        )),
        _ => ServiceError::db_error(err),
    }
}

async fn insert_material<C: ConnectionTrait>(
    db: &C,
    work_order_id: i32,
    material: &MaterialInput,
    id: Option<i32>,
    volume_used: Decimal,
) -> Result<(), ServiceError> {
    let mut row = work_order_material::ActiveModel {
        work_order_id: Set(work_order_id),
        item_name: Set(material.item_name.clone()),
        hsn_code: Set(material.hsn_code.clone()),
        unit_rate: Set(material.unit_rate),
        volume: Set(material.volume),
        volume_used: Set(volume_used),
        tax: Set(material.tax),
        tower_id: Set(material.tower_id),
        floor_ids: Set(json!(material.floor_ids)),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    if let Some(id) = id {
        row.id = Set(id);
    }
    row.insert(db).await.map_err(ServiceError::db_error)?;
    Ok(())
}

async fn insert_attachments<C: ConnectionTrait>(
    db: &C,
    work_order_id: i32,
    urls: &[String],
) -> Result<(), ServiceError> {
    for url in urls {
        work_order_attachment::ActiveModel {
            work_order_id: Set(work_order_id),
            file_url: Set(url.trim().to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(ServiceError::db_error)?;
    }
    Ok(())
}

fn floor_refs(floor_ids: &serde_json::Value, hierarchy: &PrecastHierarchy) -> Vec<FloorRef> {
    serde_json::from_value::<Vec<i32>>(floor_ids.clone())
        .unwrap_or_default()
        .into_iter()
        .map(|id| hierarchy.floor(id))
        .collect()
}

fn live_material_view(m: &work_order_material::Model, hierarchy: &PrecastHierarchy) -> MaterialView {
    MaterialView {
        id: m.id,
        item_name: m.item_name.clone(),
        hsn_code: m.hsn_code.clone(),
        unit_rate: m.unit_rate,
        volume: m.volume,
        volume_used: m.volume_used,
        balance: m.balance(),
        tax: m.tax,
        tower_id: m.tower_id,
        tower_name: hierarchy.tower_name(m.tower_id),
        floors: floor_refs(&m.floor_ids, hierarchy),
    }
}

fn revised_material_view(
    m: &work_order_material_revision::Model,
    hierarchy: &PrecastHierarchy,
) -> MaterialView {
    MaterialView {
        id: m.material_id,
        item_name: m.item_name.clone(),
        hsn_code: m.hsn_code.clone(),
        unit_rate: m.unit_rate,
        volume: m.volume,
        volume_used: m.volume_used,
        balance: m.volume - m.volume_used,
        tax: m.tax,
        tower_id: m.tower_id,
        tower_name: hierarchy.tower_name(m.tower_id),
        floors: floor_refs(&m.floor_ids, hierarchy),
    }
}

fn work_order_view(
    order: work_order::Model,
    materials: Vec<MaterialView>,
    attachments: Vec<AttachmentView>,
) -> Result<WorkOrderView, ServiceError> {
    Ok(WorkOrderView {
        payment_term: PaymentTerm::from_json(&order.payment_term)?,
        id: order.id,
        wo_number: order.wo_number,
        revision: order.revision,
        project_id: order.project_id,
        end_client_id: order.end_client_id,
        wo_date: order.wo_date,
        wo_validate: order.wo_validate,
        total_value: order.total_value,
        contact_person: order.contact_person,
        contact_email: order.contact_email,
        contact_number: order.contact_number,
        billing_address: order.billing_address,
        shipping_address: order.shipping_address,
        recurrence_patterns: order.recurrence_patterns,
        comments: order.comments,
        created_by: order.created_by,
        created_at: order.created_at,
        updated_at: order.updated_at,
        materials,
        attachments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn existing(id: i32, volume: Decimal, used: Decimal) -> work_order_material::Model {
        work_order_material::Model {
            id,
            work_order_id: 1,
            item_name: format!("M{}", id),
            hsn_code: "6810".into(),
            unit_rate: dec!(100),
            volume,
            volume_used: used,
            tax: dec!(18),
            tower_id: None,
            floor_ids: json!([]),
            created_at: Utc::now(),
        }
    }

    fn input(id: Option<i32>, volume: Decimal) -> MaterialInput {
        MaterialInput {
            id,
            item_name: "Slab".into(),
            hsn_code: "6810".into(),
            unit_rate: dec!(100),
            volume,
            tax: dec!(18),
            tower_id: None,
            floor_ids: vec![],
        }
    }

    #[test]
    fn carried_volume_follows_material_ids() {
        let current = vec![existing(1, dec!(10), dec!(4)), existing(2, dec!(5), dec!(0))];
        let carried =
            plan_material_carry_over(&current, &[input(None, dec!(3)), input(Some(1), dec!(12))])
                .unwrap();
        assert_eq!(carried, vec![dec!(0), dec!(4)]);
    }

    #[test]
    fn shrinking_below_invoiced_volume_is_rejected() {
        let current = vec![existing(1, dec!(10), dec!(4))];
        assert_matches!(
            plan_material_carry_over(&current, &[input(Some(1), dec!(3))]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn invoiced_material_cannot_be_dropped() {
        let current = vec![existing(1, dec!(10), dec!(4))];
        assert_matches!(
            plan_material_carry_over(&current, &[input(None, dec!(3))]),
            Err(ServiceError::ValidationError(msg)) if msg.contains("cannot be removed")
        );
    }

    #[test]
    fn foreign_material_id_is_rejected() {
        assert_matches!(
            plan_material_carry_over(&[], &[input(Some(77), dec!(1))]),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn tax_outside_percentage_range_fails() {
        let mut material = input(None, dec!(1));
        material.tax = dec!(101);
        assert!(material.check().is_err());
        material.tax = dec!(0);
        assert!(material.check().is_ok());
    }

    async fn store_with_order() -> (Arc<DbPool>, work_order::Model, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("wo.db").display());
        let pool = Arc::new(sea_orm::Database::connect(url).await.unwrap());
        db::run_migrations(&pool).await.unwrap();

        let client = end_client::ActiveModel {
            name: Set("Skyline Developers".into()),
            client_id: Set(500),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&*pool)
        .await
        .unwrap();

        let payload: WorkOrderPayload = serde_json::from_value(json!({
            "wo_number": "WO#21",
            "project_id": 1,
            "end_client_id": client.id,
            "wo_date": "2026-01-05",
            "wo_validate": "2026-12-31",
            "total_value": "1000",
            "contact_person": "Rahul Menon",
            "contact_email": "rahul@skyline.test",
            "contact_number": "+91-9800000000",
            "recurrence_patterns": null,
            "comments": null,
        }))
        .unwrap();
        let session = Session {
            session_id: "s".into(),
            user_id: 1,
            user_name: "Priya".into(),
            role: crate::auth::Role::ProjectManager,
            client_id: None,
        };
        let (events, _rx) = EventSender::channel(8);
        let created = WorkOrderService::new(pool.clone(), events)
            .create(payload, &session)
            .await
            .unwrap();
        let order = work_order::Entity::find_by_id(created.id)
            .one(&*pool)
            .await
            .unwrap()
            .unwrap();
        (pool, order, dir)
    }

    #[tokio::test]
    async fn taken_revision_number_is_a_conflict() {
        let (pool, order, _dir) = store_with_order().await;
        let txn = db::begin(&pool).await.unwrap();
        let now = Utc::now();

        snapshot_work_order(&txn, &order, 1, 1, now).await.unwrap();
        assert_matches!(
            snapshot_work_order(&txn, &order, 1, 1, now).await,
            Err(ServiceError::Conflict(msg)) if msg.contains("Revision 1")
        );
    }
}
