//! Display strings for the report

/// Shown wherever a value is undefined or was not extracted
pub const NOT_AVAILABLE: &str = "N/A";

/// `$1,234.56`; negative amounts as `-$1,234.56`
pub fn money(amount: f64) -> String {
    let cents = (amount.abs() * 100.0).round() as u64;
    let dollars = cents / 100;
    let rem = cents % 100;

    let digits = dollars.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, rem)
}

/// `12.34%`
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value)
}

/// Money or "N/A"
pub fn money_or_na(amount: Option<f64>) -> String {
    amount.map(money).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Percentage or "N/A"
pub fn percent_or_na(value: Option<f64>) -> String {
    value.map(percent).unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Trimmed text or "N/A" when blank
pub fn text_or_na(value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::parse_amount;
    use proptest::prelude::*;

    #[test]
    fn test_money() {
        assert_eq!(money(0.0), "$0.00");
        assert_eq!(money(60000.0), "$60,000.00");
        assert_eq!(money(1234567.891), "$1,234,567.89");
        assert_eq!(money(999.999), "$1,000.00");
        assert_eq!(money(-350.5), "-$350.50");
    }

    #[test]
    fn test_percent_and_na() {
        assert_eq!(percent(13.4), "13.40%");
        assert_eq!(percent_or_na(None), "N/A");
        assert_eq!(percent_or_na(Some(0.0)), "0.00%");
        assert_eq!(money_or_na(None), "N/A");
        assert_eq!(text_or_na("  "), "N/A");
        assert_eq!(text_or_na(" Condo "), "Condo");
    }

    proptest! {
        #[test]
        fn money_reads_back(cents in 0u64..100_000_000_000) {
            let amount = cents as f64 / 100.0;
            let parsed = parse_amount(&money(amount)).unwrap();
            prop_assert!((parsed - amount).abs() < 0.005);
        }
    }
}
