//! Code entity <-> model mapper

use warranty_core::entities::{ActivationOutcome, Code};
use warranty_core::error::DomainError;
use warranty_core::value_objects::{CodeValue, Snowflake};

use crate::models::{ActivatedCodeModel, CodeModel};

/// Convert CodeModel to Code entity
///
/// Stored values pass the same CHECK as `CodeValue::parse`; a row that does
/// not is reported rather than silently normalized.
impl TryFrom<CodeModel> for Code {
    type Error = DomainError;

    fn try_from(model: CodeModel) -> Result<Self, Self::Error> {
        let value = CodeValue::parse(&model.code).map_err(|e| {
            DomainError::InternalError(format!("stored code {:?} is malformed: {e}", model.code))
        })?;

        Ok(Code {
            value,
            product_info: model.product_info,
            user_id: model.user_id.map(Snowflake::new),
            is_used: model.is_used,
            linked_at: model.linked_at,
            warranty_activated: model.warranty_activated,
            warranty_activated_by: model.warranty_activated_by.map(Snowflake::new),
            warranty_activated_at: model.warranty_activated_at,
            warranty_expires_at: model.warranty_expires_at,
            created_at: model.created_at,
        })
    }
}

impl TryFrom<ActivatedCodeModel> for ActivationOutcome {
    type Error = DomainError;

    fn try_from(model: ActivatedCodeModel) -> Result<Self, Self::Error> {
        Ok(ActivationOutcome {
            code: Code::try_from(model.code)?,
            newly_linked: model.newly_linked,
        })
    }
}

/// Map a batch of rows, failing on the first malformed one
pub(crate) fn codes_from_models(models: Vec<CodeModel>) -> Result<Vec<Code>, DomainError> {
    models.into_iter().map(Code::try_from).collect()
}
