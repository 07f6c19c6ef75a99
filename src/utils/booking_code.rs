use crate::error::{AppError, AppResult};
use regex::Regex;

/// Trims and upper-cases a bookmaker share code.
pub fn normalize_booking_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Share codes are short alphanumeric tokens.
pub fn validate_booking_code(code: &str) -> AppResult<()> {
    let code_regex = Regex::new(r"^[A-Z0-9]{4,16}$")
        .map_err(|e| AppError::InternalError(e.to_string()))?;

    if !code_regex.is_match(code) {
        return Err(AppError::ValidationError(
            "Booking code must be 4-16 letters or digits".to_string(),
        ));
    }

    Ok(())
}

pub fn parse_booking_code(raw: &str) -> AppResult<String> {
    let code = normalize_booking_code(raw);
    if code.is_empty() {
        return Err(AppError::ValidationError(
            "Booking code is required".to_string(),
        ));
    }
    validate_booking_code(&code)?;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_booking_code() {
        assert!(validate_booking_code("ABC123").is_ok());
        assert!(validate_booking_code("AB1").is_err());
        assert!(validate_booking_code("ABC-123").is_err());
        assert!(validate_booking_code("abc123").is_err());
    }

    #[test]
    fn test_parse_booking_code_normalizes() {
        assert_eq!(parse_booking_code("  abc123 ").unwrap(), "ABC123");
        assert!(matches!(
            parse_booking_code("   "),
            Err(AppError::ValidationError(msg)) if msg == "Booking code is required"
        ));
    }
}
