use super::error::ApiErrorCode;
use regex::Regex;

const MAX_NAME_LEN: usize = 50;
const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

fn invalid(message: impl Into<String>) -> ApiErrorCode {
    ApiErrorCode::InvalidRequest(message.into())
}

pub fn short_text(field: &str, value: &str) -> Result<(), ApiErrorCode> {
    let len = value.chars().count();
    if len == 0 {
        return Err(invalid(format!("{field} is required")));
    }
    if len > MAX_NAME_LEN {
        return Err(invalid(format!(
            "{field} must be at most {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), ApiErrorCode> {
    if Regex::new(EMAIL_PATTERN).is_ok_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(invalid("email is not valid"))
    }
}

/// Strength rules applied when a password is chosen.
pub fn new_password(value: &str) -> Result<(), ApiErrorCode> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(invalid(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(invalid(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("password must contain at least one capital letter"));
    }
    if !value.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid("password must contain at least one number"));
    }
    Ok(())
}

/// Login only bounds the input; strength is not re-checked.
pub fn presented_password(value: &str) -> Result<(), ApiErrorCode> {
    if value.is_empty() {
        return Err(invalid("password is required"));
    }
    if value.chars().count() > MAX_PASSWORD_LEN {
        return Err(invalid(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
