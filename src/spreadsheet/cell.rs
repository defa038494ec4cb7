use crate::spreadsheet::style::CellStyle;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use std::fmt::Display;

/// Content of a single cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    #[default]
    Empty,
    /// Plain text
    Text(String),
    /// Numeric value (dates in the template arrive as serial numbers)
    Number(f64),
    /// Boolean value
    Boolean(bool),
    /// Formula text including the leading `=`, evaluated by the host application
    Formula(String),
    /// Native date/time written as a serial number
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Builds a formula value, adding the leading `=` when missing
    pub fn formula(text: impl Into<String>) -> CellValue {
        let text = text.into();
        if text.starts_with('=') {
            CellValue::Formula(text)
        } else {
            CellValue::Formula(format!("={text}"))
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDateTime> for CellValue {
    fn from(value: NaiveDateTime) -> Self {
        CellValue::DateTime(value)
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => write!(f, "{text}"),
            CellValue::Number(number) => write!(f, "{number}"),
            CellValue::Boolean(value) => write!(f, "{}", if *value { "TRUE" } else { "FALSE" }),
            CellValue::Formula(formula) => write!(f, "{formula}"),
            CellValue::DateTime(datetime) => write!(f, "{}", datetime.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// A cell record in the worksheet grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub style: CellStyle,
}

impl Cell {
    /// True when the cell carries neither a value nor formatting
    pub(crate) fn is_blank(&self) -> bool {
        self.value.is_empty() && self.style.is_default()
    }
}

/// Converts a date/time to its serial number in the 1900 date system.
/// Serials below 61 are one lower to honour the Lotus 1-2-3 leap year bug.
pub(crate) fn to_excel_serial(datetime: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let delta = *datetime - epoch;
    let days = delta.num_days();
    let seconds = (delta - chrono::Duration::days(days)).num_milliseconds() as f64 / 1000.0;
    let days = if days < 61 { days - 1 } else { days };
    days as f64 + seconds / 86_400.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datetime(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn serial_numbers_match_the_1900_system() {
        assert_eq!(to_excel_serial(&datetime(1900, 1, 1, 0)), 1.0);
        assert_eq!(to_excel_serial(&datetime(1900, 2, 28, 0)), 59.0);
        assert_eq!(to_excel_serial(&datetime(1900, 3, 1, 0)), 61.0);
        assert_eq!(to_excel_serial(&datetime(2026, 9, 25, 12)), 46290.5);
    }

    #[test]
    fn formulas_always_carry_the_equals_sign() {
        assert_eq!(CellValue::formula("SUM(D25:D30)"), CellValue::Formula("=SUM(D25:D30)".to_owned()));
        assert_eq!(CellValue::formula("=D25+E25"), CellValue::Formula("=D25+E25".to_owned()));
    }

    #[test]
    fn blank_cells_have_no_value_and_no_style() {
        assert!(Cell::default().is_blank());
        assert!(!Cell { value: "x".into(), ..Cell::default() }.is_blank());
    }
}
