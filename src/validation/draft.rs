use serde_json::Value as JsonValue;
use sha2::{Digest, Sha256};

use crate::error::AppError;

pub const MAX_DRAFT_ID_LEN: usize = 100;
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

pub fn validate_client_draft_id(client_id: &str) -> Result<(), AppError> {
    if client_id.is_empty() || client_id.len() > MAX_DRAFT_ID_LEN {
        return Err(AppError::validation(
            "Draft id must be between 1 and 100 characters",
        ));
    }

    if !client_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::validation(
            "Draft id may only contain letters, digits, '-' and '_'",
        ));
    }

    Ok(())
}

/// Canonical bytes of a payload. `serde_json::Value` objects are key-ordered,
/// so equal payloads serialize identically regardless of client key order.
pub fn canonical_payload(payload: &JsonValue) -> Result<Vec<u8>, AppError> {
    if !payload.is_object() {
        return Err(AppError::validation("Draft payload must be a JSON object"));
    }

    let bytes = serde_json::to_vec(payload)
        .map_err(|e| AppError::internal(format!("Failed to serialize draft: {}", e)))?;

    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(AppError::validation("Draft payload is too large (max 64 KiB)"));
    }

    Ok(bytes)
}

/// Hex SHA-256 of the canonical payload.
pub fn content_hash(payload: &JsonValue) -> Result<String, AppError> {
    let bytes = canonical_payload(payload)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}
