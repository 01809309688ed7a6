//! Request field validation

use crate::types::{AtriumError, Result};

const MAX_ID_LEN: usize = 100;
const MIN_TEXT_LEN: usize = 10;
const MAX_TEXT_LEN: usize = 5000;

/// Validate an identifier field: trimmed, non-empty, bounded length
pub fn validate_id(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AtriumError::Validation(format!("{} is required", field)));
    }
    if trimmed.len() > MAX_ID_LEN {
        return Err(AtriumError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_ID_LEN
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate free-form analysis text. The minimum length only applies when
/// there are no attachments; an image-only request is legitimate.
pub fn validate_analysis_text(text: &str, attachment_count: usize) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(AtriumError::Validation(format!(
            "Text must be at most {} characters",
            MAX_TEXT_LEN
        )));
    }
    if attachment_count == 0 && trimmed.chars().count() < MIN_TEXT_LEN {
        return Err(AtriumError::Validation(format!(
            "Text must be at least {} characters",
            MIN_TEXT_LEN
        )));
    }
    Ok(trimmed.to_string())
}
