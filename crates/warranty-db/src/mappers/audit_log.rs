//! Audit entry entity <-> model mapper

use warranty_core::entities::{Actor, AuditAction, AuditEntry};
use warranty_core::error::DomainError;
use warranty_core::value_objects::Snowflake;

use crate::models::AuditLogModel;

impl TryFrom<AuditLogModel> for AuditEntry {
    type Error = DomainError;

    fn try_from(model: AuditLogModel) -> Result<Self, Self::Error> {
        let actor = Actor::from_parts(&model.actor_kind, model.actor_id.map(Snowflake::new))
            .ok_or_else(|| {
                DomainError::InternalError(format!(
                    "audit entry {} has invalid actor {:?}",
                    model.id, model.actor_kind
                ))
            })?;
        let action = AuditAction::parse(&model.action).ok_or_else(|| {
            DomainError::InternalError(format!(
                "audit entry {} has unknown action {:?}",
                model.id, model.action
            ))
        })?;

        Ok(AuditEntry {
            id: model.id,
            user_id: model.user_id.map(Snowflake::new),
            actor,
            code: model.code,
            action,
            detail: model.detail,
            created_at: model.created_at,
        })
    }
}
