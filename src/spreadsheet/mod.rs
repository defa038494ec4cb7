//! # Spreadsheet Document Model
//!
//! A small load-mutate-save model of an `.xlsx` workbook: a grid of cells keyed by
//! `(row, column)`, a separate set of merge regions, row and column dimensions,
//! anchored pictures and print settings. Templates are read with [`xlsx`] and saved
//! with [`writer`].
//!
//! Rows and columns are 1-based everywhere in this API. Writes aimed at a cell that
//! is covered by a merge region land on the region's anchor cell.
pub mod cell;
pub mod drawing;
pub(crate) mod excel;
pub mod merge;
pub mod page;
pub mod reference;
pub mod style;
pub(crate) mod writer;
pub(crate) mod xlsx;

use crate::error::SiteSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::drawing::SheetImage;
use crate::spreadsheet::merge::CellRange;
use crate::spreadsheet::merge::MergeSet;
use crate::spreadsheet::page::PageSetup;
use crate::spreadsheet::page::SheetView;
use crate::spreadsheet::style::CellStyle;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors raised while reading, mutating or writing a workbook
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Part '{0}' is missing from the workbook package")]
    FileError(String),

    #[error("Workbook '{0}' contains no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Worksheet index {0} is out of range")]
    SheetIndexError(usize),

    #[error("Shared string index {0} is out of range")]
    SharedStringIndexError(usize),

    #[error("Invalid cell range '{0}'")]
    InvalidRange(String),

    #[error("Cannot merge '{0}': a merge region needs at least two cells inside the sheet")]
    InvalidMerge(String),

    #[error("Cannot merge '{0}': it overlaps the merged region '{1}'")]
    MergeConflict(String, String),
}

static EMPTY_VALUE: CellValue = CellValue::Empty;

/// One worksheet of a workbook.
#[derive(Clone, Debug, Default)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<(u32, u16), Cell>,
    merges: MergeSet,
    row_heights: BTreeMap<u32, f64>,
    column_widths: BTreeMap<u16, f64>,
    hidden_rows: BTreeSet<u32>,
    hidden_columns: BTreeSet<u16>,
    row_styles: BTreeMap<u32, CellStyle>,
    column_styles: BTreeMap<u16, CellStyle>,
    images: Vec<SheetImage>,
    row_breaks: BTreeSet<u32>,
    print_area: Option<CellRange>,
    print_title_rows: Option<(u32, u32)>,
    pub(crate) default_row_height: Option<f64>,
    pub page_setup: PageSetup,
    pub view: SheetView,
}

impl Worksheet {
    pub fn new(name: &str) -> Worksheet {
        Worksheet {
            name: name.to_owned(),
            ..Worksheet::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw cell record stored at a position
    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = (&(u32, u16), &Cell)> {
        self.cells.iter()
    }

    /// The value visible at a position; covered cells show their anchor's value
    pub fn value(&self, row: u32, col: u16) -> &CellValue {
        let key = self.merges.anchor_of(row, col);
        self.cells.get(&key).map(|cell| &cell.value).unwrap_or(&EMPTY_VALUE)
    }

    /// Writes a value, redirecting covered cells to their merge anchor
    pub fn set_value(&mut self, row: u32, col: u16, value: impl Into<CellValue>) {
        let key = self.merges.anchor_of(row, col);
        self.cells.entry(key).or_default().value = value.into();
    }

    /// Empties the value slot at exactly this position, merged or not
    pub fn clear_value(&mut self, row: u32, col: u16) {
        if let Some(cell) = self.cells.get_mut(&(row, col)) {
            cell.value = CellValue::Empty;
            if cell.is_blank() {
                self.cells.remove(&(row, col));
            }
        }
    }

    pub fn style(&self, row: u32, col: u16) -> Option<&CellStyle> {
        self.cells.get(&(row, col)).map(|cell| &cell.style)
    }

    /// Mutable style of the cell at exactly this position, created on demand
    pub fn style_mut(&mut self, row: u32, col: u16) -> &mut CellStyle {
        &mut self.cells.entry((row, col)).or_default().style
    }

    pub fn set_style(&mut self, row: u32, col: u16, style: CellStyle) {
        *self.style_mut(row, col) = style;
    }

    pub fn row_height(&self, row: u32) -> Option<f64> {
        self.row_heights.get(&row).copied()
    }

    /// Sets a custom row height in points; `None` restores the default height
    pub fn set_row_height(&mut self, row: u32, height: Option<f64>) {
        match height {
            Some(height) => self.row_heights.insert(row, height),
            None => self.row_heights.remove(&row),
        };
    }

    pub(crate) fn row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn column_width(&self, col: u16) -> Option<f64> {
        self.column_widths.get(&col).copied()
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub(crate) fn column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub(crate) fn hidden_rows(&self) -> &BTreeSet<u32> {
        &self.hidden_rows
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.contains(&col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    pub(crate) fn hidden_columns(&self) -> &BTreeSet<u16> {
        &self.hidden_columns
    }

    /// Style applied to the empty cells of a whole row
    pub fn row_style(&self, row: u32) -> Option<&CellStyle> {
        self.row_styles.get(&row)
    }

    pub fn set_row_style(&mut self, row: u32, style: Option<CellStyle>) {
        match style {
            Some(style) => self.row_styles.insert(row, style),
            None => self.row_styles.remove(&row),
        };
    }

    pub(crate) fn row_styles(&self) -> &BTreeMap<u32, CellStyle> {
        &self.row_styles
    }

    /// Style applied to the empty cells of a whole column
    pub fn column_style(&self, col: u16) -> Option<&CellStyle> {
        self.column_styles.get(&col)
    }

    pub fn set_column_style(&mut self, col: u16, style: Option<CellStyle>) {
        match style {
            Some(style) => self.column_styles.insert(col, style),
            None => self.column_styles.remove(&col),
        };
    }

    pub(crate) fn column_styles(&self) -> &BTreeMap<u16, CellStyle> {
        &self.column_styles
    }

    /// Highest column holding a cell record or touched by a merge region
    pub fn max_column(&self) -> u16 {
        let cells = self.cells.keys().map(|(_, col)| *col).max().unwrap_or(0);
        let merges = self.merges.iter().map(|region| region.last_col).max().unwrap_or(0);
        cells.max(merges).max(1)
    }

    /// Highest row holding a cell record or touched by a merge region
    pub fn max_row(&self) -> u32 {
        let cells = self.cells.keys().map(|(row, _)| *row).max().unwrap_or(0);
        let merges = self.merges.iter().map(|region| region.last_row).max().unwrap_or(0);
        cells.max(merges).max(1)
    }

    pub fn merges(&self) -> &MergeSet {
        &self.merges
    }

    /// Merges a region. Values of the covered cells are discarded, styles stay.
    pub fn merge(&mut self, range: CellRange) -> Result<(), SpreadsheetError> {
        self.merges.insert(range)?;
        for (row, col) in range.cells().skip(1) {
            self.clear_value(row, col);
        }
        Ok(())
    }

    pub fn unmerge(&mut self, range: &CellRange) -> bool {
        self.merges.remove(range)
    }

    /// Removes every merge region intersecting `range`
    pub fn unmerge_overlapping(&mut self, range: &CellRange) -> Vec<CellRange> {
        self.merges.remove_overlapping(range)
    }

    pub fn images(&self) -> &[SheetImage] {
        &self.images
    }

    pub fn add_image(&mut self, image: SheetImage) {
        self.images.push(image);
    }

    /// Manual page breaks; a value `b` ends a page after row `b`
    pub fn row_breaks(&self) -> Vec<u32> {
        self.row_breaks.iter().copied().collect()
    }

    pub fn add_row_break(&mut self, row: u32) {
        self.row_breaks.insert(row);
    }

    pub fn print_area(&self) -> Option<CellRange> {
        self.print_area
    }

    pub fn set_print_area(&mut self, range: Option<CellRange>) {
        self.print_area = range;
    }

    pub fn print_title_rows(&self) -> Option<(u32, u32)> {
        self.print_title_rows
    }

    pub fn set_print_title_rows(&mut self, rows: Option<(u32, u32)>) {
        self.print_title_rows = rows.map(|(first, last)| (first.min(last), first.max(last)));
    }

    /// Inserts `count` empty rows before row `at`. Everything at or below `at`
    /// moves down: cells, row heights, hidden rows, row styles, merge regions,
    /// pictures, page breaks, the print area and the print title rows.
    pub fn insert_rows(&mut self, at: u32, count: u32) {
        if count == 0 {
            return;
        }

        let moved = self.cells.split_off(&(at, 0));
        self.cells.extend(moved.into_iter().map(|((row, col), cell)| ((row + count, col), cell)));

        let moved = self.row_heights.split_off(&at);
        self.row_heights.extend(moved.into_iter().map(|(row, height)| (row + count, height)));

        let moved = self.row_styles.split_off(&at);
        self.row_styles.extend(moved.into_iter().map(|(row, style)| (row + count, style)));

        let moved = self.hidden_rows.split_off(&at);
        self.hidden_rows.extend(moved.into_iter().map(|row| row + count));

        self.merges.insert_rows(at, count);
        for image in &mut self.images {
            image.anchor.insert_rows(at, count);
        }

        self.row_breaks = self.row_breaks
            .iter()
            .map(|&row| if row >= at { row + count } else { row })
            .collect();

        if let Some(area) = &mut self.print_area {
            area.insert_rows(at, count);
        }
        if let Some((first, last)) = &mut self.print_title_rows {
            if *first >= at {
                *first += count;
                *last += count;
            } else if *last >= at {
                *last += count;
            }
        }
    }
}

/// An in-memory workbook.
#[derive(Clone, Debug, Default)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
    active: usize,
}

impl Workbook {
    pub fn new() -> Workbook {
        Workbook::default()
    }

    /// Reads a workbook package from disk
    pub fn open(path: &Path) -> Result<Workbook, SiteSheetError> {
        let reader = UnifiedReader::open(path)?;
        xlsx::read_workbook(reader, &path.to_string_lossy())
    }

    /// Reads a workbook package that is already in memory
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Workbook, SiteSheetError> {
        xlsx::read_workbook(UnifiedReader::from_bytes(bytes), "<memory>")
    }

    /// Serializes the workbook into `.xlsx` bytes
    pub fn save_to_buffer(&self) -> Result<Vec<u8>, SiteSheetError> {
        writer::write_workbook(self)
    }

    pub fn add_worksheet(&mut self, worksheet: Worksheet) -> &mut Worksheet {
        self.sheets.push(worksheet);
        let index = self.sheets.len() - 1;
        &mut self.sheets[index]
    }

    pub fn worksheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    pub fn worksheet(&self, index: usize) -> Result<&Worksheet, SpreadsheetError> {
        self.sheets.get(index).ok_or(SpreadsheetError::SheetIndexError(index))
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Result<&mut Worksheet, SpreadsheetError> {
        self.sheets.get_mut(index).ok_or(SpreadsheetError::SheetIndexError(index))
    }

    /// Removes a worksheet; the active index follows the remaining sheets
    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet, SpreadsheetError> {
        if index >= self.sheets.len() {
            return Err(SpreadsheetError::SheetIndexError(index));
        }
        let removed = self.sheets.remove(index);
        if self.active > index || self.active >= self.sheets.len() {
            self.active = self.active.saturating_sub(1);
        }
        Ok(removed)
    }

    pub fn active(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) -> Result<(), SpreadsheetError> {
        if index >= self.sheets.len() {
            return Err(SpreadsheetError::SheetIndexError(index));
        }
        self.active = index;
        Ok(())
    }

    /// Marks exactly one worksheet tab as selected
    pub fn select_only(&mut self, index: usize) -> Result<(), SpreadsheetError> {
        if index >= self.sheets.len() {
            return Err(SpreadsheetError::SheetIndexError(index));
        }
        for (position, sheet) in self.sheets.iter_mut().enumerate() {
            sheet.view.tab_selected = position == index;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::drawing::AnchorMarker;
    use crate::spreadsheet::drawing::EditAs;
    use crate::spreadsheet::drawing::TwoCellAnchor;
    use crate::spreadsheet::style::Font;

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    #[test]
    fn writes_to_covered_cells_land_on_the_anchor() {
        let mut sheet = Worksheet::new("Report");
        sheet.merge(range("B7:K7")).unwrap();
        sheet.set_value(7, 5, "Project Name : Tower");
        assert_eq!(sheet.value(7, 2), &CellValue::from("Project Name : Tower"));
        assert_eq!(sheet.value(7, 9), &CellValue::from("Project Name : Tower"));
        assert!(sheet.cell(7, 5).is_none());
    }

    #[test]
    fn merging_drops_covered_values_but_keeps_styles() {
        let mut sheet = Worksheet::new("Report");
        sheet.set_value(25, 2, "kept");
        sheet.set_value(25, 3, "ghost");
        sheet.style_mut(25, 3).font = Font::new("Arial", 10.0);
        sheet.merge(range("B25:C25")).unwrap();
        assert_eq!(sheet.cell(25, 3).unwrap().value, CellValue::Empty);
        assert_eq!(sheet.style(25, 3).unwrap().font.name.as_deref(), Some("Arial"));
        assert_eq!(sheet.value(25, 2), &CellValue::from("kept"));
    }

    #[test]
    fn row_insertion_shifts_everything_below() {
        let mut sheet = Worksheet::new("Report");
        sheet.set_value(30, 2, "above");
        sheet.set_value(31, 2, "TOTAL");
        sheet.set_row_height(31, Some(18.0));
        sheet.merge(range("B31:C31")).unwrap();
        sheet.add_row_break(40);
        sheet.set_print_area(Some(range("B1:K75")));
        sheet.add_image(SheetImage::anchored(
            Vec::new(),
            TwoCellAnchor {
                from: AnchorMarker::new(1, 0, 34, 0),
                to: AnchorMarker::new(1, 10, 34, 10),
                edit_as: EditAs::OneCell,
            },
        ));

        sheet.insert_rows(31, 3);

        assert_eq!(sheet.value(30, 2), &CellValue::from("above"));
        assert_eq!(sheet.value(31, 2), &CellValue::Empty);
        assert_eq!(sheet.value(34, 2), &CellValue::from("TOTAL"));
        assert_eq!(sheet.row_height(34), Some(18.0));
        assert_eq!(sheet.row_height(31), None);
        assert!(sheet.merges().contains(&range("B34:C34")));
        assert_eq!(sheet.row_breaks(), vec![43]);
        assert_eq!(sheet.print_area(), Some(range("B1:K78")));
        assert_eq!(sheet.images()[0].top_left(), (38, 2));
    }

    #[test]
    fn row_insertion_moves_hidden_rows_and_row_styles() {
        let mut sheet = Worksheet::new("Report");
        let shaded = CellStyle {
            font: Font::new("Arial", 9.0),
            ..CellStyle::default()
        };
        sheet.set_row_hidden(20, true);
        sheet.set_row_hidden(44, true);
        sheet.set_row_style(44, Some(shaded.clone()));
        sheet.set_column_hidden(12, true);

        sheet.insert_rows(31, 2);

        assert!(sheet.is_row_hidden(20));
        assert!(!sheet.is_row_hidden(44));
        assert!(sheet.is_row_hidden(46));
        assert_eq!(sheet.row_style(44), None);
        assert_eq!(sheet.row_style(46), Some(&shaded));
        assert!(sheet.is_column_hidden(12));
        sheet.set_row_hidden(46, false);
        assert_eq!(sheet.hidden_rows().iter().copied().collect::<Vec<_>>(), vec![20]);
    }

    #[test]
    fn removing_sheets_keeps_the_active_index_valid() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet(Worksheet::new("Report"));
        workbook.add_worksheet(Worksheet::new("Reference"));
        workbook.set_active(1).unwrap();
        let removed = workbook.remove_worksheet(0).unwrap();
        assert_eq!(removed.name(), "Report");
        assert_eq!(workbook.active(), 0);
        assert_eq!(workbook.worksheets().len(), 1);
        assert!(workbook.remove_worksheet(3).is_err());
    }

    #[test]
    fn selects_exactly_one_tab() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet(Worksheet::new("Report")).view.tab_selected = false;
        workbook.add_worksheet(Worksheet::new("Reference")).view.tab_selected = true;
        workbook.select_only(0).unwrap();
        let selected = workbook.worksheets().iter().map(|sheet| sheet.view.tab_selected).collect::<Vec<_>>();
        assert_eq!(selected, vec![true, false]);
    }
}
