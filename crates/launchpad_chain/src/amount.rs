//! Base-unit conversion and display formatting.
//!
//! On-chain amounts are `i128` base units (stroops for XLM). Conversions from
//! display text are exact; `f64` only appears at presentation time.

use chrono::{DateTime, Utc};

/// Decimals used by XLM and by tokens that do not say otherwise.
pub const DEFAULT_DECIMALS: u32 = 7;
/// Stroops in one XLM.
pub const STROOPS_PER_XLM: i128 = 10_000_000;

const MAX_DECIMALS: u32 = 38;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("invalid amount: {0}")]
    Invalid(String),

    #[error("amount must not be negative")]
    Negative,

    #[error("amount must be a finite number")]
    NonFinite,

    #[error("amount is too large")]
    Overflow,
}

fn pow10(decimals: u32) -> Result<i128, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::Overflow);
    }
    Ok(10i128.pow(decimals))
}

/// `floor(display * 10^decimals)`, computed exactly from decimal text.
/// Extra fractional digits are truncated.
pub fn to_base_units(display: &str, decimals: u32) -> Result<i128, AmountError> {
    let text = display.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    if text.starts_with('-') {
        return Err(AmountError::Negative);
    }

    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, f),
        None => (text, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(AmountError::Invalid(display.to_string()));
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit())
        || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(AmountError::Invalid(display.to_string()));
    }

    let scale = pow10(decimals)?;
    let whole: i128 = if int_part.is_empty() {
        0
    } else {
        int_part.parse().map_err(|_| AmountError::Overflow)?
    };

    let mut frac: i128 = 0;
    let mut digits = 0;
    for b in frac_part.bytes().take(decimals as usize) {
        frac = frac * 10 + (b - b'0') as i128;
        digits += 1;
    }
    frac *= pow10(decimals - digits)?;

    whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or(AmountError::Overflow)
}

/// [`to_base_units`] for a float display value. The float is rendered with
/// its shortest round-trip representation first, so `0.3` converts to
/// `3000000` rather than `2999999`.
pub fn to_base_units_f64(display: f64, decimals: u32) -> Result<i128, AmountError> {
    if !display.is_finite() {
        return Err(AmountError::NonFinite);
    }
    to_base_units(&display.to_string(), decimals)
}

/// `base / 10^decimals` as a display float.
pub fn from_base_units(base: i128, decimals: u32) -> f64 {
    match pow10(decimals) {
        Ok(scale) => base as f64 / scale as f64,
        Err(_) => 0.0,
    }
}

/// Exact decimal rendering of a base-unit amount, trailing zeros trimmed.
pub fn format_base_units(base: i128, decimals: u32) -> String {
    let Ok(scale) = pow10(decimals) else {
        return base.to_string();
    };
    let sign = if base < 0 { "-" } else { "" };
    let abs = base.unsigned_abs();
    let scale = scale as u128;
    let whole = abs / scale;
    let frac = abs % scale;
    if frac == 0 {
        return format!("{sign}{whole}");
    }
    let frac = format!("{frac:0width$}", width = decimals as usize);
    format!("{sign}{whole}.{}", frac.trim_end_matches('0'))
}

/// Total XLM cost, in stroops, of buying `amount` base units at
/// `price_per_token` stroops per whole token with `token_decimals` decimals.
pub fn order_total_cost(
    amount: i128,
    price_per_token: i128,
    token_decimals: u32,
) -> Result<i128, AmountError> {
    amount
        .checked_mul(price_per_token)
        .map(|v| v / pow10(token_decimals).unwrap_or(1))
        .ok_or(AmountError::Overflow)
}

// ---------------------------------------------------------------------------
// Display helpers
// ---------------------------------------------------------------------------

/// en-US style: thousands separators and a fixed number of fraction digits.
pub fn format_number(value: f64, fraction_digits: usize) -> String {
    if !value.is_finite() {
        return "0".into();
    }
    let fixed = format!("{:.*}", fraction_digits, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let is_zero = fixed.bytes().all(|b| b == b'0' || b == b'.');
    let sign = if value < 0.0 && !is_zero { "-" } else { "" };
    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

pub fn format_currency(value: f64, currency: &str) -> String {
    format!("{} {currency}", format_number(value, 2))
}

/// `GABC...WXYZ` style shortening. Short inputs are returned unchanged.
pub fn format_address(address: &str, start_chars: usize, end_chars: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= start_chars + end_chars {
        return address.to_string();
    }
    let head: String = chars[..start_chars].iter().collect();
    let tail: String = chars[chars.len() - end_chars..].iter().collect();
    format!("{head}...{tail}")
}

/// Signed percentage, e.g. `+4.20%`.
pub fn format_percentage(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "" };
    format!("{sign}{}%", format_number(value, 2))
}

/// `Jan 5, 2024, 03:04 PM`
pub fn format_date(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// Coarsest whole unit elapsed: `3d ago`, `2h ago`, `5m ago`, `9s ago`.
pub fn format_relative_time(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds().max(0);
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;
    if days > 0 {
        format!("{days}d ago")
    } else if hours > 0 {
        format!("{hours}h ago")
    } else if minutes > 0 {
        format!("{minutes}m ago")
    } else {
        format!("{seconds}s ago")
    }
}

pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars).collect();
    format!("{head}...")
}

/// Unix seconds to a UTC timestamp; out-of-range values map to the epoch.
pub fn timestamp_from_secs(secs: u64) -> DateTime<Utc> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_default()
}
