pub const CURRENCY: &str = "\u{20b9}";

/// Format a float as a rupee amount with thousands separators: ₹1,234.56
pub fn money(val: f64) -> String {
    let negative = val < 0.0;
    let cents = format!("{:.2}", val.abs());
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let grouped = group_thousands(int_part);
    if negative {
        format!("-{CURRENCY}{grouped}.{dec_part}")
    } else {
        format!("{CURRENCY}{grouped}.{dec_part}")
    }
}

/// Signed card amount: "-₹250.00" for debits, "+₹1,500.00" for credits.
pub fn signed_money(val: f64) -> String {
    if val < 0.0 {
        money(val)
    } else {
        format!("+{}", money(val))
    }
}

/// Whole-rupee amount for chart axes and legends: ₹12,500
pub fn money_whole(val: f64) -> String {
    let rounded = val.abs().round() as u64;
    let grouped = group_thousands(&rounded.to_string());
    if val < 0.0 {
        format!("-{CURRENCY}{grouped}")
    } else {
        format!("{CURRENCY}{grouped}")
    }
}

fn group_thousands(digits: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// Truncate to `max` characters, ending with an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{truncated}\u{2026}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_formatting() {
        assert_eq!(money(1234.56), "\u{20b9}1,234.56");
        assert_eq!(money(-500.00), "-\u{20b9}500.00");
        assert_eq!(money(0.0), "\u{20b9}0.00");
        assert_eq!(money(1000000.99), "\u{20b9}1,000,000.99");
    }

    #[test]
    fn test_signed_money() {
        assert_eq!(signed_money(-250.0), "-\u{20b9}250.00");
        assert_eq!(signed_money(1500.0), "+\u{20b9}1,500.00");
    }

    #[test]
    fn test_money_whole() {
        assert_eq!(money_whole(12499.6), "\u{20b9}12,500");
        assert_eq!(money_whole(0.0), "\u{20b9}0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Swiggy", 10), "Swiggy");
        assert_eq!(truncate("SWIGGY INSTAMART BLR", 8), "SWIGGY \u{2026}");
    }
}
