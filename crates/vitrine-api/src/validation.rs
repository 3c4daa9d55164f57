//! Request validation shared by handlers.

use crate::constants::MAX_BATCH_SIZE;
use vitrine_core::AppError;

/// Normalize a MIME type: lowercase, parameters dropped.
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// Accept only content types from the configured allowlist.
pub fn validate_content_type(content_type: &str, allowed: &[String]) -> Result<(), AppError> {
    let essence = essence(content_type);
    if allowed.iter().any(|a| *a == essence) {
        Ok(())
    } else {
        Err(AppError::UnsupportedMediaType(format!(
            "Content type '{}' is not allowed. Allowed: {}",
            content_type,
            allowed.join(", ")
        )))
    }
}

/// Batch resolve requests carry between 1 and `MAX_BATCH_SIZE` URLs.
pub fn validate_batch(urls: &[String]) -> Result<(), AppError> {
    if urls.is_empty() {
        return Err(AppError::InvalidInput(
            "At least one canonical URL is required".to_string(),
        ));
    }
    if urls.len() > MAX_BATCH_SIZE {
        return Err(AppError::InvalidInput(format!(
            "Too many URLs: {} (max {})",
            urls.len(),
            MAX_BATCH_SIZE
        )));
    }
    Ok(())
}
