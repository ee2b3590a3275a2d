use rust_decimal::Decimal;

/// Format an amount with two decimals followed by the currency code
pub fn format_price(amount: Decimal, currency_code: &str) -> String {
    format!("{:.2} {}", amount.round_dp(2), currency_code)
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().unwrap_or(default).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(Decimal::from(21), "EUR"), "21.00 EUR");
        assert_eq!(format_price(Decimal::from_str("9.5").unwrap(), "USD"), "9.50 USD");
        assert_eq!(format_price(Decimal::from_str("0.125").unwrap(), "EUR"), "0.12 EUR");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
        assert_eq!(truncate_string("héllo wörld", 8), "héllo...");
    }

    #[test]
    fn test_format_optional() {
        assert_eq!(format_optional(&None, "-"), "-");
        assert_eq!(format_optional(&Some("x".to_string()), "-"), "x");
    }
}
