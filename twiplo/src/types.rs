//! Shared identifier types and small helpers.
//!
//! - [`FileAssetId`]: primary key of a stored file asset
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use uuid::Uuid;

pub type FileAssetId = Uuid;

/// Abbreviate a UUID to its first 8 characters, for log fields.
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
