//! Rupiah amounts in the id-ID convention: `.` groups thousands, no
//! decimals.

/// Format a whole-rupiah amount.
///
/// ```
/// use struk::receipt::money::format_amount;
///
/// assert_eq!(format_amount(88_000), "88.000");
/// assert_eq!(format_amount(1_250_000), "1.250.000");
/// assert_eq!(format_amount(-5_000), "-5.000");
/// assert_eq!(format_amount(500), "500");
/// ```
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grouping() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1_000), "1.000");
        assert_eq!(format_amount(28_000), "28.000");
        assert_eq!(format_amount(100_000), "100.000");
        assert_eq!(format_amount(12_345_678), "12.345.678");
    }

    #[test]
    fn test_negative() {
        assert_eq!(format_amount(-5_000), "-5.000");
        assert_eq!(format_amount(-999), "-999");
    }
}
