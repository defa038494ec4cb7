//! A1-style cell reference conversion. Rows and columns are 1-based throughout.
use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of rows on a worksheet
pub const MAX_ROWS: u32 = 1_048_576;
/// Maximum number of columns on a worksheet
pub const MAX_COLUMNS: u16 = 16_384;

static REFERENCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?([A-Za-z]{1,3})\$?(\d+)$").expect("Hardcode regex pattern"));

/// Converts a 1-based column index to its letter name (1 → `A`, 28 → `AB`)
pub fn column_name(col: u16) -> String {
    let mut col = col as u32;
    let mut name = Vec::<u8>::with_capacity(3);
    while col > 0 {
        let remainder = (col - 1) % 26;
        name.push(b'A' + remainder as u8);
        col = (col - 1) / 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Converts column letters to a 1-based index, `None` if out of range
pub fn column_index(name: &str) -> Option<u16> {
    if name.is_empty() {
        return None;
    }
    let mut index = 0u32;
    for ch in name.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        index = index * 26 + (ch.to_ascii_uppercase() - b'A' + 1) as u32;
        if index > MAX_COLUMNS as u32 {
            return None;
        }
    }
    Some(index as u16)
}

/// Formats a cell reference such as `B7`
pub fn cell_reference(row: u32, col: u16) -> String {
    format!("{}{}", column_name(col), row)
}

/// Parses `B7` or `$B$7` into `(row, col)`
pub fn parse_reference(reference: &str) -> Option<(u32, u16)> {
    let captures = REFERENCE_PATTERN.captures(reference.trim())?;
    let col = column_index(&captures[1])?;
    let row = captures[2].parse::<u32>().ok().filter(|row| (1..=MAX_ROWS).contains(row))?;
    Some((row, col))
}

static SHIFTABLE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)([A-Za-z]{1,3})(\$?)(\d+)$").expect("Hardcode regex pattern"));

fn is_name_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '_' | '.' | '$')
}

/// Moves one reference token; `None` when the token is not a cell reference
fn shift_reference(token: &str, rows: i64, cols: i64) -> Option<String> {
    let captures = SHIFTABLE_PATTERN.captures(token)?;
    let mut col = column_index(&captures[2])? as i64;
    let mut row = captures[4].parse::<i64>().ok().filter(|row| (1..=MAX_ROWS as i64).contains(row))?;
    if captures[1].is_empty() {
        col += cols;
    }
    if captures[3].is_empty() {
        row += rows;
    }
    if !(1..=MAX_COLUMNS as i64).contains(&col) || !(1..=MAX_ROWS as i64).contains(&row) {
        return Some("#REF!".to_owned());
    }
    Some(format!("{}{}{}{row}", &captures[1], column_name(col as u16), &captures[3]))
}

/// Moves the relative references of a formula by `rows` and `cols`.
///
/// Absolute parts (`$B`, `$7`) stay put. String literals and quoted sheet
/// names are copied unchanged, names followed by `(` are functions, and a
/// reference pushed off the sheet becomes `#REF!`.
pub(crate) fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    let mut shifted = String::with_capacity(formula.len());
    let mut chars = formula.char_indices().peekable();
    while let Some((start, ch)) = chars.next() {
        match ch {
            '"' | '\'' => {
                shifted.push(ch);
                for (_, inner) in chars.by_ref() {
                    shifted.push(inner);
                    if inner == ch {
                        break;
                    }
                }
            }
            _ if is_name_char(ch) => {
                let mut end = start + ch.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = index + next.len_utf8();
                    chars.next();
                }
                let token = &formula[start..end];
                let is_call = chars.peek().is_some_and(|&(_, next)| next == '(');
                match shift_reference(token, rows, cols) {
                    Some(moved) if !is_call => shifted.push_str(&moved),
                    _ => shifted.push_str(token),
                }
            }
            _ => shifted.push(ch),
        }
    }
    shifted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_column_names() {
        assert_eq!(column_name(1), "A");
        assert_eq!(column_name(11), "K");
        assert_eq!(column_name(26), "Z");
        assert_eq!(column_name(27), "AA");
        assert_eq!(column_name(16_384), "XFD");
        assert_eq!(column_index("xfd"), Some(16_384));
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index(""), None);
    }

    #[test]
    fn parses_absolute_and_relative_references() {
        assert_eq!(parse_reference("B7"), Some((7, 2)));
        assert_eq!(parse_reference("$K$75"), Some((75, 11)));
        assert_eq!(parse_reference("A0"), None);
        assert_eq!(parse_reference("7B"), None);
        assert_eq!(cell_reference(31, 4), "D31");
    }

    #[test]
    fn shifts_relative_parts_of_formula_references() {
        assert_eq!(shift_formula("D34+E34", 2, 0), "D36+E36");
        assert_eq!(shift_formula("SUM($D$25:D33)*$B1", 1, 1), "SUM($D$25:E34)*$B2");
        assert_eq!(shift_formula("IF(A1=\"B2\",'Q1 Data'!C3,LOG10(A1))", 1, 0), "IF(A2=\"B2\",'Q1 Data'!C4,LOG10(A2))");
        assert_eq!(shift_formula("A1*1.5E3", 0, 1), "B1*1.5E3");
        assert_eq!(shift_formula("A2-B$1", -1, -1), "#REF!-A$1");
    }
}
