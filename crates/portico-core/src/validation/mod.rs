//! Upload validation rules.
//!
//! The MIME allow-list is checked twice during an upload: once against the
//! client-declared type before any network call, and again at confirmation
//! time against the type the storage backend itself reports for the stored
//! object.

use crate::error::AppError;

/// Document content types accepted for upload.
pub const ALLOWED_DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "text/csv",
];

/// Check a MIME type against the allow-list. Parameters (e.g. `; charset=`)
/// are ignored; the comparison is case-insensitive.
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();
    ALLOWED_DOCUMENT_CONTENT_TYPES.contains(&essence.as_str())
}

/// Validate the client-declared content type of an upload candidate.
pub fn ensure_allowed_content_type(content_type: &str) -> Result<(), AppError> {
    if is_allowed_content_type(content_type) {
        Ok(())
    } else {
        Err(AppError::InvalidInput(format!(
            "Content type '{}' is not supported; allowed: {}",
            content_type,
            ALLOWED_DOCUMENT_CONTENT_TYPES.join(", ")
        )))
    }
}

/// Document-type tag must be present and non-blank.
pub fn ensure_document_type(document_type: &str) -> Result<(), AppError> {
    if document_type.trim().is_empty() {
        Err(AppError::InvalidInput(
            "Document type must not be empty".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_accepts_documents() {
        assert!(is_allowed_content_type("application/pdf"));
        assert!(is_allowed_content_type("text/csv"));
        assert!(is_allowed_content_type(
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        ));
    }

    #[test]
    fn test_allow_list_ignores_parameters_and_case() {
        assert!(is_allowed_content_type("text/plain; charset=utf-8"));
        assert!(is_allowed_content_type("Application/PDF"));
    }

    #[test]
    fn test_allow_list_rejects_other_types() {
        assert!(!is_allowed_content_type("image/png"));
        assert!(!is_allowed_content_type("application/zip"));
        assert!(!is_allowed_content_type("application/octet-stream"));
    }

    #[test]
    fn test_ensure_document_type_rejects_blank() {
        assert!(ensure_document_type("Rent Roll").is_ok());
        assert!(ensure_document_type("").is_err());
        assert!(ensure_document_type("   ").is_err());
    }
}
