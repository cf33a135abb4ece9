use std::{collections::HashSet, str::FromStr};

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;

/// 全形數字與半形數字在 Unicode 上的固定差距
const FULL_WIDTH_OFFSET: u32 = 0xFEE0;

lazy_static! {
    static ref BR_RE: Regex = Regex::new(r"(?i)<br\s*/?>").unwrap();
    static ref TAG_RE: Regex = Regex::new(r"<[^>]+>").unwrap();
    static ref NBSP_RE: Regex = Regex::new(r"&nbsp;?").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// 將全形數字 (０-９) 轉為半形數字，其他字元原樣保留
///
/// # Example
///
/// ```
/// assert_eq!(to_half_width("１２日"), "12日");
/// ```
pub fn to_half_width(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from_u32(c as u32 - FULL_WIDTH_OFFSET).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Turns the inner HTML of a table cell into plain text.
///
/// Line breaks and every other tag become a space, `&nbsp;` becomes a space,
/// whitespace runs collapse to one space and the result is trimmed. This only
/// strips tags; it never parses the fragment, so broken markup simply leaves
/// whatever text survives the tag removal.
pub fn sanitize_cell(html_fragment: &str) -> String {
    let text = BR_RE.replace_all(html_fragment, " ");
    let text = TAG_RE.replace_all(&text, " ");
    let text = NBSP_RE.replace_all(&text, " ");
    SPACES_RE.replace_all(&text, " ").trim().to_string()
}

/// 以單一空白合併連續空白並去除頭尾空白
pub fn collapse_whitespace(s: &str) -> String {
    SPACES_RE.replace_all(s, " ").trim().to_string()
}

/// Parses a decimal value from a given string.
///
/// The characters in `escape_chars` (for instance the `,` thousands
/// separator) are removed before parsing.
///
/// # Example
///
/// ```
/// let value = parse_decimal("1,234.56", Some(vec![','])).unwrap();
/// ```
pub fn parse_decimal(s: &str, escape_chars: Option<Vec<char>>) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s, escape_chars);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Removes a set of escape characters from a given string.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    match escape_chars {
        None => s.to_string(),
        Some(ec) => {
            let filters = ec.into_iter().collect::<HashSet<_>>();
            s.chars().filter(|c| !filters.contains(c)).collect()
        }
    }
}
