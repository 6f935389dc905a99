use std::fmt;

/// Prices and rates are integer cents, so 1.50 per hour is stored as 150.
pub type Cents = i64;

/// Format cents as a price string.
/// Example: 150 -> "1.50", 5 -> "0.05"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a non-negative decimal amount into cents.
/// Example: "1.50" -> 150, "1.5" -> 150, "2" -> 200
///
/// Digits past the second decimal place are rejected rather than truncated,
/// since a rate of "1.505" has no exact cent value.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    if input.starts_with('-') {
        return Err(ParseCentsError::Negative);
    }

    let (units_str, decimals_str) = input.split_once('.').unwrap_or((input, ""));
    if units_str.is_empty() && decimals_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !decimals_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?
    };

    let decimal_cents: i64 = match decimals_str.len() {
        0 => 0,
        1 => decimals_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        2 => decimals_str.parse().map_err(|_| ParseCentsError::InvalidFormat)?,
        _ => return Err(ParseCentsError::TooPrecise),
    };

    units
        .checked_mul(100)
        .and_then(|c| c.checked_add(decimal_cents))
        .ok_or(ParseCentsError::InvalidFormat)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    Negative,
    TooPrecise,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::Negative => write!(f, "amount must not be negative"),
            ParseCentsError::TooPrecise => write!(f, "amount has more than two decimal places"),
        }
    }
}

impl std::error::Error for ParseCentsError {}
