use bazaar_catalog::AppError;
use garde::Validate;

/// Runs a DTO's `garde` validation and turns the first failing rule into a
/// `Validation` error message.
pub fn validated<T: Validate<Context = ()>>(value: &T) -> Result<(), AppError> {
    value.validate().map_err(|report| AppError::Validation(report.to_string()))
}
