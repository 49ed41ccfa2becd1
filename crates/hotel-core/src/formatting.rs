/// Format a floating-point number with thousands separators and a fixed number
/// of decimal places.
///
/// # Examples
///
/// ```
/// use hotel_core::formatting::format_number;
///
/// assert_eq!(format_number(1234.5,  1), "1,234.5");
/// assert_eq!(format_number(1234567.0, 0), "1,234,567");
/// assert_eq!(format_number(0.0, 2), "0.00");
/// assert_eq!(format_number(-9876.5, 1), "-9,876.5");
/// ```
pub fn format_number(value: f64, decimals: u32) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = round_half_up(value.abs(), decimals);
    let text = format!("{:.*}", decimals as usize, magnitude);

    match text.split_once('.') {
        Some((whole, fraction)) => format!("{sign}{}.{fraction}", group_thousands(whole)),
        None => format!("{sign}{}", group_thousands(&text)),
    }
}

/// Round a non-negative value to `decimals` places with ties going up.
///
/// The scaled value is nudged by one ULP so midpoints stored just below the
/// tie (1.005 is 1.00499...) still round away from zero.
fn round_half_up(magnitude: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    let scaled = magnitude * factor;
    (scaled + f64::EPSILON * scaled).round() / factor
}

/// Format a revenue amount in rupees with two decimals and thousands
/// separators.
///
/// ```
/// use hotel_core::formatting::format_currency;
///
/// assert_eq!(format_currency(1234.56), "₹1,234.56");
/// assert_eq!(format_currency(-9.99),   "₹-9.99");
/// ```
pub fn format_currency(amount: f64) -> String {
    if amount < 0.0 {
        format!("₹-{}", format_number(amount.abs(), 2))
    } else {
        format!("₹{}", format_number(amount, 2))
    }
}

/// Format an already-computed percentage with two decimals, e.g. `"58.23%"`.
pub fn format_percent(pct: f64) -> String {
    format!("{}%", format_number(pct, 2))
}

/// Insert commas every three digits from the right of an ASCII digit string.
fn group_thousands(digits: &str) -> String {
    let groups: Vec<&str> = digits
        .as_bytes()
        .rchunks(3)
        .rev()
        .filter_map(|chunk| std::str::from_utf8(chunk).ok())
        .collect();
    groups.join(",")
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number_zero() {
        assert_eq!(format_number(0.0, 0), "0");
        assert_eq!(format_number(0.0, 2), "0.00");
    }

    #[test]
    fn test_format_number_with_thousands() {
        assert_eq!(format_number(1_234.5, 1), "1,234.5");
        assert_eq!(format_number(1_000.0, 0), "1,000");
    }

    #[test]
    fn test_format_number_revenue_scale() {
        assert_eq!(format_number(1_708_771_229.0, 0), "1,708,771,229");
    }

    #[test]
    fn test_format_number_rounds_up() {
        assert_eq!(format_number(1.005, 2), "1.01");
        assert_eq!(format_number(999.996, 2), "1,000.00");
        assert_eq!(format_number(-2.5, 0), "-3");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(0.0), "₹0.00");
        assert_eq!(format_currency(10_010.0), "₹10,010.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(58.226), "58.23%");
        assert_eq!(format_percent(100.0), "100.00%");
    }

    #[test]
    fn test_group_thousands_lengths() {
        assert_eq!(group_thousands(""), "");
        assert_eq!(group_thousands("5"), "5");
        assert_eq!(group_thousands("999"), "999");
        assert_eq!(group_thousands("1234"), "1,234");
        assert_eq!(group_thousands("123456"), "123,456");
    }
}
