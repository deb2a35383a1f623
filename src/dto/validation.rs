//! Validation helpers for DTOs.

use validator::ValidationError;

/// Validates a contact phone number: optional leading `+`, then 7 to 15 digits.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.strip_prefix('+').unwrap_or(phone);

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        let mut err = ValidationError::new("phone_format");
        err.message = Some("Phone number must contain only digits after an optional `+`".into());
        return Err(err);
    }

    if !(7..=15).contains(&digits.len()) {
        let mut err = ValidationError::new("phone_length");
        err.message =
            Some(format!("Phone number must be 7-15 digits (got {})", digits.len()).into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone_valid() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("+905551234567").is_ok());
        assert!(validate_phone("1234567").is_ok());
    }

    #[test]
    fn test_validate_phone_invalid_format() {
        assert!(validate_phone("").is_err());
        assert!(validate_phone("+").is_err());
        assert!(validate_phone("555-123-4567").is_err());
        assert!(validate_phone("phone").is_err());
        assert!(validate_phone("555 1234").is_err());
    }

    #[test]
    fn test_validate_phone_invalid_length() {
        assert!(validate_phone("123456").is_err()); // too short
        assert!(validate_phone("1234567890123456").is_err()); // too long
    }
}
