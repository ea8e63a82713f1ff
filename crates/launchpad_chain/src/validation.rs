//! Form input validation.
//!
//! Each validator takes the raw text a user typed and either returns the
//! parsed value or a [`ValidationError`] carrying the message shown next to
//! the field.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::strkey::STRKEY_LEN;

pub const MAX_AMOUNT: f64 = 1_000_000_000.0;
pub const MAX_PRICE: f64 = 1_000_000.0;
pub const MAX_DECIMALS: u32 = 18;
/// Largest integer a double can hold exactly.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

static TOKEN_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9\s]+$").expect("valid regex: token name"));
static TOKEN_SYMBOL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{2,12}$").expect("valid regex: token symbol"));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

/// `None` for blank input, `Some(Err)` for text that is not a finite number.
fn parse_number(input: &str) -> Option<Result<f64, ()>> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or(()))
}

fn positive_bounded(
    input: &str,
    required: &str,
    invalid: &str,
    not_positive: &str,
    max: f64,
    too_large: &str,
) -> Result<f64, ValidationError> {
    let value = match parse_number(input) {
        None => return Err(ValidationError::new(required)),
        Some(Err(())) => return Err(ValidationError::new(invalid)),
        Some(Ok(v)) => v,
    };
    if value <= 0.0 {
        return Err(ValidationError::new(not_positive));
    }
    if value > max {
        return Err(ValidationError::new(too_large));
    }
    Ok(value)
}

/// Trade amount: `0 < x <= 1e9`.
pub fn validate_amount(input: &str) -> Result<f64, ValidationError> {
    positive_bounded(
        input,
        "Amount is required",
        "Invalid amount",
        "Amount must be greater than 0",
        MAX_AMOUNT,
        "Amount is too large",
    )
}

/// Price per token: `0 < x <= 1e6`.
pub fn validate_price(input: &str) -> Result<f64, ValidationError> {
    positive_bounded(
        input,
        "Price is required",
        "Invalid price",
        "Price must be greater than 0",
        MAX_PRICE,
        "Price is too high",
    )
}

/// Initial token supply: `0 < x <= 2^53 - 1`.
pub fn validate_initial_supply(input: &str) -> Result<f64, ValidationError> {
    positive_bounded(
        input,
        "Initial supply is required",
        "Invalid supply value",
        "Supply must be greater than 0",
        MAX_SAFE_INTEGER,
        "Supply is too large",
    )
}

pub fn validate_token_name(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::new("Token name is required"));
    }
    let len = input.chars().count();
    if len < 3 {
        return Err(ValidationError::new("Token name must be at least 3 characters"));
    }
    if len > 32 {
        return Err(ValidationError::new("Token name must be less than 32 characters"));
    }
    if !TOKEN_NAME.is_match(input) {
        return Err(ValidationError::new(
            "Token name can only contain letters, numbers, and spaces",
        ));
    }
    Ok(())
}

/// Accepts exactly the strings matching `^[A-Z0-9]{2,12}$`.
pub fn validate_symbol(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::new("Token symbol is required"));
    }
    let len = input.chars().count();
    if len < 2 {
        return Err(ValidationError::new("Symbol must be at least 2 characters"));
    }
    if len > 12 {
        return Err(ValidationError::new("Symbol must be less than 12 characters"));
    }
    if !TOKEN_SYMBOL.is_match(input) {
        return Err(ValidationError::new(
            "Symbol must be uppercase letters and numbers only",
        ));
    }
    Ok(())
}

pub fn validate_decimals(input: &str) -> Result<u32, ValidationError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(ValidationError::new("Decimals is required"));
    }
    let value: i64 = text
        .parse()
        .map_err(|_| ValidationError::new("Invalid decimals value"))?;
    if value < 0 {
        return Err(ValidationError::new("Decimals cannot be negative"));
    }
    if value > MAX_DECIMALS as i64 {
        return Err(ValidationError::new("Decimals cannot exceed 18"));
    }
    Ok(value as u32)
}

/// Account (`G...`) or contract (`C...`) address. Only the shape is checked.
pub fn validate_address(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::new("Address is required"));
    }
    if !(input.starts_with('G') || input.starts_with('C')) || input.len() != STRKEY_LEN {
        return Err(ValidationError::new("Invalid Stellar address"));
    }
    Ok(())
}

pub fn validate_contract_id(input: &str) -> Result<(), ValidationError> {
    if input.is_empty() {
        return Err(ValidationError::new("Contract ID is required"));
    }
    if !input.starts_with('C') || input.len() != STRKEY_LEN {
        return Err(ValidationError::new("Invalid contract ID"));
    }
    Ok(())
}

/// Generic bounded number field.
pub fn validate_number(
    input: &str,
    min: f64,
    max: f64,
    field_name: &str,
) -> Result<f64, ValidationError> {
    let value = match parse_number(input) {
        None => return Err(ValidationError::new(format!("{field_name} is required"))),
        Some(Err(())) => {
            return Err(ValidationError::new(format!(
                "Invalid {}",
                field_name.to_lowercase()
            )));
        }
        Some(Ok(v)) => v,
    };
    if value < min {
        return Err(ValidationError::new(format!("{field_name} must be at least {min}")));
    }
    if value > max {
        return Err(ValidationError::new(format!("{field_name} cannot exceed {max}")));
    }
    Ok(value)
}

pub fn validate_string_length(
    input: &str,
    min_len: usize,
    max_len: usize,
    field_name: &str,
) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Err(ValidationError::new(format!("{field_name} is required")));
    }
    let len = input.chars().count();
    if len < min_len {
        return Err(ValidationError::new(format!(
            "{field_name} must be at least {min_len} characters"
        )));
    }
    if len > max_len {
        return Err(ValidationError::new(format!(
            "{field_name} must be less than {max_len} characters"
        )));
    }
    Ok(())
}

/// Optional metadata URL: blank is fine, anything else must parse.
pub fn validate_optional_url(input: &str) -> Result<(), ValidationError> {
    if input.trim().is_empty() {
        return Ok(());
    }
    url::Url::parse(input.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::new("Invalid URL format"))
}
