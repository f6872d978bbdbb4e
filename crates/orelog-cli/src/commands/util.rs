//! Shared rendering helpers.

/// Formats a volume as "1,234.5" (one decimal, comma-grouped).
#[must_use]
pub fn format_volume(volume: f64) -> String {
    let formatted = format!("{volume:.1}");
    let (integer, fraction) = formatted
        .split_once('.')
        .unwrap_or((formatted.as_str(), "0"));
    let (sign, digits) = integer
        .strip_prefix('-')
        .map_or(("", integer), |rest| ("-", rest));

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    format!("{sign}{grouped}.{fraction}")
}

#[cfg(test)]
mod tests {
    use super::format_volume;

    #[test]
    fn groups_thousands() {
        assert_eq!(format_volume(0.0), "0.0");
        assert_eq!(format_volume(999.94), "999.9");
        assert_eq!(format_volume(1_000.0), "1,000.0");
        assert_eq!(format_volume(1_234_567.89), "1,234,567.9");
        assert_eq!(format_volume(-1_234.5), "-1,234.5");
    }
}
