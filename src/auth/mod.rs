/*!
 * # Session Authentication
 *
 * Every API call carries an opaque session id in the `Authorization` header.
 * The value is looked up verbatim (it is not a bearer token) through a
 * [`SessionStore`]; the resolved [`Session`] is placed into the request
 * extensions for handlers to extract.
 */

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::debug;

use crate::db::DbPool;
use crate::entities::{session, user};
use crate::errors::ServiceError;

pub mod policy;

pub use policy::AccessPolicy;

/// Roles known to the ERP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Superadmin,
    Admin,
    ProjectManager,
    SiteEngineer,
    Viewer,
}

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub user_id: i32,
    pub user_name: String,
    pub role: Role,
    /// Owning client for admins scoped to one customer organisation
    pub client_id: Option<i32>,
}

impl Session {
    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn is_superadmin(&self) -> bool {
        self.has_role(Role::Superadmin)
    }
}

/// Resolves a raw session id to the calling user.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns `None` for unknown or expired sessions.
    async fn lookup(&self, session_id: &str) -> Result<Option<Session>, ServiceError>;
}

/// Session lookup against the `sessions` and `users` tables.
#[derive(Clone)]
pub struct DbSessionStore {
    db: Arc<DbPool>,
}

impl DbSessionStore {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn lookup(&self, session_id: &str) -> Result<Option<Session>, ServiceError> {
        let found = session::Entity::find()
            .filter(session::Column::SessionId.eq(session_id))
            .find_also_related(user::Entity)
            .one(&*self.db)
            .await
            .map_err(ServiceError::db_error)?;

        let (row, owner) = match found {
            Some((row, Some(owner))) => (row, owner),
            _ => return Ok(None),
        };

        if row.expires_at <= Utc::now() {
            debug!(user_id = row.user_id, "Session expired");
            return Ok(None);
        }

        let role = owner
            .role
            .parse::<Role>()
            .map_err(|_| ServiceError::AuthError(format!("Unknown role '{}'", owner.role)))?;

        Ok(Some(Session {
            session_id: row.session_id,
            user_id: owner.id,
            user_name: owner.name,
            role,
            client_id: owner.client_id,
        }))
    }
}

/// Rejects requests without a valid session and stores the [`Session`]
/// in the request extensions.
pub async fn require_session(
    State(store): State<Arc<dyn SessionStore>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let raw = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ServiceError::MissingSession("Authorization header is required".into()))?
        .to_str()
        .map_err(|_| ServiceError::AuthError("Invalid session".into()))?
        .trim()
        .to_string();

    if raw.is_empty() {
        return Err(ServiceError::MissingSession(
            "Authorization header is required".into(),
        ));
    }

    let session = store
        .lookup(&raw)
        .await?
        .ok_or_else(|| ServiceError::AuthError("Invalid session".into()))?;

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| ServiceError::MissingSession("Authorization header is required".into()))
    }
}
