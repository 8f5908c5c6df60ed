use sea_orm::{ColumnTrait, Condition};

use super::{Role, Session};
use crate::entities::end_client;
use crate::errors::ServiceError;

/// Turns the caller's role into query predicates and permission checks.
#[derive(Debug, Clone, Copy)]
pub struct AccessPolicy<'a> {
    session: &'a Session,
}

impl<'a> AccessPolicy<'a> {
    pub fn for_session(session: &'a Session) -> Self {
        Self { session }
    }

    /// Fails with `Forbidden` unless the caller holds one of `roles`.
    /// Superadmins always pass.
    pub fn require_any(&self, roles: &[Role]) -> Result<(), ServiceError> {
        if self.session.is_superadmin() || roles.contains(&self.session.role) {
            return Ok(());
        }
        Err(ServiceError::Forbidden(format!(
            "Role '{}' may not perform this action",
            self.session.role
        )))
    }

    /// Roles that may approve erection requests, revise work orders and
    /// finalise invoices.
    pub fn require_manager(&self) -> Result<(), ServiceError> {
        self.require_any(&[Role::Admin, Role::ProjectManager])
    }

    /// Row filter over `end_clients` for invoice visibility.
    ///
    /// Superadmins see every invoice; admins see those whose end client is
    /// owned by their own client. Nobody else may list invoices.
    pub fn invoice_visibility(&self) -> Result<Condition, ServiceError> {
        match self.session.role {
            Role::Superadmin => Ok(Condition::all()),
            Role::Admin => match self.session.client_id {
                Some(client_id) => {
                    Ok(Condition::all().add(end_client::Column::ClientId.eq(client_id)))
                }
                None => Err(ServiceError::Forbidden(
                    "Admin account is not linked to a client".to_string(),
                )),
            },
            role => Err(ServiceError::Forbidden(format!(
                "Role '{}' may not view invoices",
                role
            ))),
        }
    }
}
