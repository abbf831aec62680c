/// Format an integer with comma thousands separators: `1234567` -> `1,234,567`.
pub fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Format a decimal with comma separators and at most three fraction digits,
/// trailing zeros trimmed: `1234.5` -> `1,234.5`, `52.0` -> `52`.
/// Ties round away from zero: `0.0625` -> `0.063`.
pub fn decimal(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }

    // f64::round rounds half away from zero
    let millis = (value.abs() * 1000.0).round() as u64;
    let (int_part, frac_part) = (millis / 1000, millis % 1000);
    let frac = format!("{frac_part:03}");
    let frac = frac.trim_end_matches('0');

    let mut out = String::new();
    if value < 0.0 && millis > 0 {
        out.push('-');
    }
    out.push_str(&thousands(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(150_000), "150,000");
        assert_eq!(thousands(8_336_817), "8,336,817");
    }

    #[test]
    fn test_decimal() {
        assert_eq!(decimal(1234.5), "1,234.5");
        assert_eq!(decimal(52.0), "52");
        assert_eq!(decimal(5.851), "5.851");
        assert_eq!(decimal(1.23456), "1.235");
        assert_eq!(decimal(-1500.25), "-1,500.25");
        assert_eq!(decimal(-0.0001), "0");
    }

    #[test]
    fn test_decimal_ties_round_away_from_zero() {
        assert_eq!(decimal(0.0625), "0.063");
        assert_eq!(decimal(2.0625), "2.063");
        assert_eq!(decimal(-2.0625), "-2.063");
    }
}
