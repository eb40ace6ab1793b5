//! Input validation for person contact fields.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid UK postcode format.
    InvalidPostcode(String),
    /// Invalid phone number.
    InvalidPhoneNumber(String),
    /// Invalid email format.
    InvalidEmail(String),
    /// Value too long.
    TooLong {
        field: String,
        max: usize,
        actual: usize,
    },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidPostcode(msg) => write!(f, "Invalid postcode: {}", msg),
            ValidationError::InvalidPhoneNumber(msg) => {
                write!(f, "Invalid phone number: {}", msg)
            }
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// UK postcode pattern derived from British Standard BS7666.
static UK_POSTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Z]{1,2}[0-9][A-Z0-9]?)([0-9][A-Z]{2})$").unwrap());

/// BFPO (British Forces Post Office) postcode pattern.
static BFPO_POSTCODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(BFPO?)([0-9]{1,4})$").unwrap());

/// Country code pattern for international phone numbers.
static COUNTRY_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+\d{1,3}").unwrap());

/// Validate a UK or BFPO postcode, returning the normalized form.
///
/// Whitespace is stripped, the postcode is uppercased, and the outward and
/// inward parts are joined by a single space: `"sw1a1aa"` becomes
/// `"SW1A 1AA"`.
///
/// Any correctly formatted postcode is considered valid at this stage,
/// regardless of whether it exists.
pub fn validate_postcode(postcode: &str) -> Result<String, ValidationError> {
    let compact: String = postcode
        .split_whitespace()
        .collect::<String>()
        .to_uppercase();

    if compact.is_empty() {
        return Err(ValidationError::Empty("postcode".to_string()));
    }

    let captures = UK_POSTCODE
        .captures(&compact)
        .or_else(|| BFPO_POSTCODE.captures(&compact))
        .ok_or_else(|| {
            ValidationError::InvalidPostcode(
                "must be a correctly formatted UK or BFPO postcode".to_string(),
            )
        })?;

    Ok(format!("{} {}", &captures[1], &captures[2]))
}

/// Validate a phone number without being strict on formatting.
///
/// Only the country code length (when present) and the number of national
/// digits are checked; the original formatting is preserved in the
/// returned value.
pub fn validate_phone_number(phone_number: &str) -> Result<String, ValidationError> {
    let trimmed = phone_number.trim();

    if trimmed.is_empty() {
        return Err(ValidationError::Empty("phone number".to_string()));
    }

    // Digits (and a leading +) only, for length validation.
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();

    let national_number = if trimmed.starts_with('+') {
        let code = COUNTRY_CODE.find(trimmed).ok_or_else(|| {
            ValidationError::InvalidPhoneNumber(
                "country code must be + followed by 1-3 digits".to_string(),
            )
        })?;
        // The match includes the +, so the code itself is one shorter.
        &digits[code.len() - 1..]
    } else {
        &digits[..]
    };

    if !(7..=15).contains(&national_number.len()) {
        return Err(ValidationError::InvalidPhoneNumber(
            "must be between 7 and 15 digits long (excluding the country code)".to_string(),
        ));
    }

    Ok(phone_number.to_string())
}

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has at least one character after @
/// - Has at least one dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Empty("email".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: MAX_EMAIL_LENGTH,
            actual: email.len(),
        });
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(
            "domain cannot start or end with a dot".to_string(),
        ));
    }

    if domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain cannot contain consecutive dots".to_string(),
        ));
    }

    Ok(())
}
