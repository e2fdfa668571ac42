//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::dao::models::calendar_date;

/// Rejects values made only of whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Value must not be blank".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a date is written as `YYYY-MM-DD`.
///
/// # Examples
///
/// ```ignore
/// validate_calendar_date("2025-03-14") // Ok
/// validate_calendar_date("14/03/2025") // Err - wrong layout
/// validate_calendar_date("2025-02-30") // Err - no such day
/// ```
pub fn validate_calendar_date(value: &str) -> Result<(), ValidationError> {
    if calendar_date::parse(value).is_err() {
        let mut err = ValidationError::new("calendar_date");
        err.message = Some(format!("Date must use the YYYY-MM-DD format (got {value:?})").into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_not_blank() {
        assert!(validate_not_blank("thai").is_ok());
        assert!(validate_not_blank("").is_err());
        assert!(validate_not_blank("   ").is_err());
    }

    #[test]
    fn test_validate_calendar_date() {
        assert!(validate_calendar_date("2025-03-14").is_ok());
        assert!(validate_calendar_date("2024-02-29").is_ok());
        assert!(validate_calendar_date("2025-02-30").is_err()); // no such day
        assert!(validate_calendar_date("14/03/2025").is_err());
        assert!(validate_calendar_date("").is_err());
    }
}
