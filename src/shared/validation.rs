use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    /// Regex for validating username fields
    /// Must start with a lowercase letter or underscore, then lowercase alphanumerics/underscores
    /// - Valid: "john_doe", "user123", "_admin"
    /// - Invalid: "123user", "JohnDoe", "user-name", "user name"
    pub static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-z_][a-z0-9_]*$").unwrap();

    /// Exactly ten digits, no separators
    pub static ref PHONE_REGEX: Regex = Regex::new(r"^[0-9]{10}$").unwrap();
}

/// Minimum accepted password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Password strength rule: at least 8 characters containing a lowercase letter,
/// an uppercase letter, a digit and a symbol.
///
/// The `regex` crate has no lookahead, so each class is checked separately.
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_symbol = password
        .chars()
        .any(|c| !c.is_alphanumeric() && !c.is_whitespace());

    if long_enough && has_lower && has_upper && has_digit && has_symbol {
        Ok(())
    } else {
        let mut err = ValidationError::new("password_strength");
        err.message = Some(
            "Password must be at least 8 characters and include uppercase, lowercase, number and special character"
                .into(),
        );
        Err(err)
    }
}
