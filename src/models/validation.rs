use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{0} must not be blank")]
    Blank(&'static str),
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
        value: f64,
    },
    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("availableSeats must be at least 1")]
    NoSeats,
    #[error("{field} is not a valid {expected}: {value:?}")]
    Malformed {
        field: &'static str,
        expected: &'static str,
        value: String,
    },
    #[error("{0}")]
    Rejected(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

pub fn required<T>(value: Option<T>, field: &'static str) -> ValidationResult<T> {
    value.ok_or(ValidationError::Missing(field))
}

pub fn required_text(value: Option<String>, field: &'static str) -> ValidationResult<String> {
    let value = required(value, field)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(trimmed.to_string())
}

pub fn positive_amount(value: Option<f64>, field: &'static str) -> ValidationResult<f64> {
    let value = required(value, field)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

pub fn within(value: f64, field: &'static str, min: f64, max: f64) -> ValidationResult<f64> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        });
    }
    Ok(value)
}

/// Trims optional free text, mapping blank input to `None`.
pub fn normalize_optional(input: Option<String>) -> Option<String> {
    input.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_rejects_blank() {
        assert_eq!(
            required_text(Some("  Ana ".into()), "driverName"),
            Ok("Ana".to_string())
        );
        assert_eq!(
            required_text(Some("   ".into()), "driverName"),
            Err(ValidationError::Blank("driverName"))
        );
        assert_eq!(
            required_text(None, "driverName"),
            Err(ValidationError::Missing("driverName"))
        );
    }

    #[test]
    fn positive_amount_rejects_zero_and_nan() {
        assert!(positive_amount(Some(0.0), "price").is_err());
        assert!(positive_amount(Some(-3.0), "price").is_err());
        assert!(positive_amount(Some(f64::NAN), "price").is_err());
        assert_eq!(positive_amount(Some(250.0), "price"), Ok(250.0));
    }

    #[test]
    fn normalize_optional_drops_whitespace() {
        assert_eq!(normalize_optional(Some(" \t".into())), None);
        assert_eq!(normalize_optional(Some(" hi ".into())), Some("hi".into()));
    }
}
