//! Contact form validation.

use std::sync::LazyLock;

use regex::Regex;

use crate::api::ClientInfo;
use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap_or_else(|e| panic!("invalid email regex: {e}"))
});

/// Non-blank after trimming.
pub fn required(value: &str) -> bool {
    !value.trim().is_empty()
}

pub fn email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// 10 to 15 digits once punctuation is stripped.
pub fn phone(value: &str) -> bool {
    let digits = value.chars().filter(char::is_ascii_digit).count();
    (10..=15).contains(&digits)
}

/// Trim every field and check all of them, reporting every failing field.
pub fn client_info(info: &ClientInfo) -> Result<ClientInfo, Vec<ValidationError>> {
    let cleaned = ClientInfo {
        first_name: info.first_name.trim().to_string(),
        last_name: info.last_name.trim().to_string(),
        email: info.email.trim().to_string(),
        phone_number: info.phone_number.trim().to_string(),
    };

    let mut errors = Vec::new();
    if !required(&cleaned.first_name) {
        errors.push(ValidationError::Required { field: "firstName" });
    }
    if !required(&cleaned.last_name) {
        errors.push(ValidationError::Required { field: "lastName" });
    }
    if !required(&cleaned.email) {
        errors.push(ValidationError::Required { field: "email" });
    } else if !email(&cleaned.email) {
        errors.push(ValidationError::InvalidEmail);
    }
    if !required(&cleaned.phone_number) {
        errors.push(ValidationError::Required { field: "phone" });
    } else if !phone(&cleaned.phone_number) {
        errors.push(ValidationError::InvalidPhone);
    }

    if errors.is_empty() {
        Ok(cleaned)
    } else {
        Err(errors)
    }
}
