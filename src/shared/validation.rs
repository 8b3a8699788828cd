//! Validation Utilities

use validator::{Validate, ValidationErrors};

use super::error::AppError;

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Eq)]
struct FieldError {
    field: String,
    message: String,
}

/// Convert validation errors to AppError
pub fn validation_error(errors: ValidationErrors) -> AppError {
    let mut field_errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();

    // HashMap iteration order is unstable; report deterministically.
    field_errors.sort_by(|a, b| a.field.cmp(&b.field));

    let message = field_errors
        .first()
        .map(|e| format!("{}: {}", e.field, e.message))
        .unwrap_or_else(|| "Validation failed".into());

    AppError::Validation(message)
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        validation_error(errors)
    }
}

/// Run derive-based validation, mapping failures to `AppError::Validation`.
pub fn validate<T: Validate>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(validation_error)
}

/// Require an identifier that the DTO models as optional.
pub fn require_id(id: Option<uuid::Uuid>, field: &str) -> Result<uuid::Uuid, AppError> {
    id.ok_or_else(|| AppError::Validation(format!("{}: is required", field)))
}

/// Reject blank strings where a value was supplied.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}
