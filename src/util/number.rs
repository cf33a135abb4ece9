use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

use crate::util::text;

lazy_static! {
    /// 數字、小數點、千分位逗號、空白與負號以外的字元
    static ref NON_NUMERIC_RE: Regex = Regex::new(r"[^0-9.,\s-]").unwrap();
}

/// Extracts every number that appears in a free-text cell, in order.
///
/// Full-width digits are normalized first, anything that cannot be part of a
/// number becomes a space, and each space-separated token is parsed after its
/// thousands separators are removed. Tokens that do not parse (a lone `-`,
/// `1.2.3`, ...) are skipped.
///
/// # Example
///
/// ```
/// let numbers = extract_numbers("1,234円 ５６７ -");
/// assert_eq!(numbers, vec![dec!(1234), dec!(567)]);
/// ```
pub fn extract_numbers(s: &str) -> Vec<Decimal> {
    let half = text::to_half_width(s);
    let cleaned = text::collapse_whitespace(&NON_NUMERIC_RE.replace_all(&half, " "));
    if cleaned.is_empty() {
        return Vec::new();
    }

    cleaned
        .split(' ')
        .filter(|token| token.chars().any(|c| c.is_ascii_digit()))
        .filter_map(|token| text::parse_decimal(token, Some(vec![','])).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_extract_numbers() {
        assert_eq!(
            extract_numbers("1,234円 ５６７ -"),
            vec![dec!(1234), dec!(567)]
        );
    }

    #[test]
    fn test_extract_numbers_keeps_order_and_sign() {
        assert_eq!(
            extract_numbers("安値 310 / 平均 320.5 / 高値 -5"),
            vec![dec!(310), dec!(320.5), dec!(-5)]
        );
    }

    #[test]
    fn test_extract_numbers_empty() {
        assert!(extract_numbers("").is_empty());
        assert!(extract_numbers("休市").is_empty());
        assert!(extract_numbers(" - . , ").is_empty());
    }

    #[test]
    fn test_extract_numbers_unit_separated() {
        assert_eq!(
            extract_numbers("300円310円"),
            vec![dec!(300), dec!(310)]
        );
    }

    #[test]
    fn test_extract_numbers_invalid_tokens() {
        assert_eq!(extract_numbers("1.2.3 45"), vec![dec!(45)]);
    }
}
