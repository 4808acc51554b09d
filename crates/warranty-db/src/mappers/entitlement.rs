//! Entitlement snapshot entity <-> model mapper

use warranty_core::entities::EntitlementSnapshot;
use warranty_core::value_objects::Snowflake;

use crate::models::EntitlementSnapshotModel;

impl From<EntitlementSnapshotModel> for EntitlementSnapshot {
    fn from(model: EntitlementSnapshotModel) -> Self {
        EntitlementSnapshot {
            user_id: Snowflake::new(model.user_id),
            has_premium: model.has_premium,
            has_warranty: model.has_warranty,
            code_linked: model.code_linked,
            warranty_expires_at: model.warranty_expires_at,
            last_updated: model.last_updated,
        }
    }
}
