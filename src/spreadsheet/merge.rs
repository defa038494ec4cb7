use crate::error::SiteSheetError;
use crate::spreadsheet::reference::cell_reference;
use crate::spreadsheet::reference::parse_reference;
use crate::spreadsheet::reference::MAX_COLUMNS;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::SpreadsheetError;
use std::fmt::Display;
use std::str::FromStr;

/// A rectangular block of cells, inclusive on both ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// Creates a range from two corners in any order
    pub fn new(row1: u32, col1: u16, row2: u32, col2: u16) -> CellRange {
        CellRange {
            first_row: row1.min(row2),
            first_col: col1.min(col2),
            last_row: row1.max(row2),
            last_col: col1.max(col2),
        }
    }

    /// A range spanning `first_col..=last_col` on a single row
    pub fn row_span(row: u32, first_col: u16, last_col: u16) -> CellRange {
        CellRange::new(row, first_col, row, last_col)
    }

    pub fn contains(&self, row: u32, col: u16) -> bool {
        (self.first_row..=self.last_row).contains(&row) && (self.first_col..=self.last_col).contains(&col)
    }

    pub fn intersects(&self, other: &CellRange) -> bool {
        self.first_row <= other.last_row
            && other.first_row <= self.last_row
            && self.first_col <= other.last_col
            && other.first_col <= self.last_col
    }

    pub fn is_single_cell(&self) -> bool {
        self.first_row == self.last_row && self.first_col == self.last_col
    }

    /// Top-left cell
    pub fn anchor(&self) -> (u32, u16) {
        (self.first_row, self.first_col)
    }

    /// The same columns moved `offset` rows down
    pub fn shifted(&self, offset: u32) -> CellRange {
        CellRange {
            first_row: self.first_row + offset,
            last_row: self.last_row + offset,
            ..*self
        }
    }

    /// Every `(row, col)` position in the range, row by row
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16)> + '_ {
        (self.first_row..=self.last_row)
            .flat_map(move |row| (self.first_col..=self.last_col).map(move |col| (row, col)))
    }

    /// Adjusts the range for `count` rows inserted before row `at`.
    /// Ranges below move down, ranges straddling the insertion point grow.
    pub(crate) fn insert_rows(&mut self, at: u32, count: u32) {
        if self.first_row >= at {
            self.first_row += count;
            self.last_row += count;
        } else if self.last_row >= at {
            self.last_row += count;
        }
    }

    fn in_bounds(&self) -> bool {
        self.first_row >= 1 && self.last_row <= MAX_ROWS && self.first_col >= 1 && self.last_col <= MAX_COLUMNS
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let first = cell_reference(self.first_row, self.first_col);
        if self.is_single_cell() {
            write!(f, "{first}")
        } else {
            write!(f, "{first}:{}", cell_reference(self.last_row, self.last_col))
        }
    }
}

impl FromStr for CellRange {
    type Err = SiteSheetError;

    /// Parses `B7:K7`, `$B$1:$K$75` or a single reference
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || SpreadsheetError::InvalidRange(value.to_owned());
        let (first, last) = value.split_once(':').unwrap_or((value, value));
        let (row1, col1) = parse_reference(first).ok_or_else(invalid)?;
        let (row2, col2) = parse_reference(last).ok_or_else(invalid)?;
        Ok(CellRange::new(row1, col1, row2, col2))
    }
}

/// The merge regions of one worksheet. Regions never overlap.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MergeSet {
    regions: Vec<CellRange>,
}

impl MergeSet {
    pub fn iter(&self) -> impl Iterator<Item = &CellRange> {
        self.regions.iter()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn contains(&self, range: &CellRange) -> bool {
        self.regions.contains(range)
    }

    /// The region covering a cell, if any
    pub fn region_at(&self, row: u32, col: u16) -> Option<&CellRange> {
        self.regions.iter().find(|region| region.contains(row, col))
    }

    /// The writable cell for a position: the region anchor when merged, else itself
    pub fn anchor_of(&self, row: u32, col: u16) -> (u32, u16) {
        self.region_at(row, col).map(CellRange::anchor).unwrap_or((row, col))
    }

    /// True for a cell inside a region that is not the region's anchor
    pub fn is_covered(&self, row: u32, col: u16) -> bool {
        self.region_at(row, col)
            .map(|region| region.anchor() != (row, col))
            .unwrap_or(false)
    }

    /// Adds a region. Overlapping, single-cell and out-of-bounds regions are rejected.
    pub fn insert(&mut self, range: CellRange) -> Result<(), SpreadsheetError> {
        if range.is_single_cell() || !range.in_bounds() {
            return Err(SpreadsheetError::InvalidMerge(range.to_string()));
        }
        if let Some(existing) = self.regions.iter().find(|region| region.intersects(&range)) {
            return Err(SpreadsheetError::MergeConflict(range.to_string(), existing.to_string()));
        }
        self.regions.push(range);
        Ok(())
    }

    /// Removes an exact region, reporting whether it existed
    pub fn remove(&mut self, range: &CellRange) -> bool {
        let before = self.regions.len();
        self.regions.retain(|region| region != range);
        self.regions.len() != before
    }

    /// Removes every region intersecting `range` and returns them
    pub fn remove_overlapping(&mut self, range: &CellRange) -> Vec<CellRange> {
        let (removed, kept): (Vec<CellRange>, Vec<CellRange>) =
            self.regions.drain(..).partition(|region| region.intersects(range));
        self.regions = kept;
        removed
    }

    pub(crate) fn insert_rows(&mut self, at: u32, count: u32) {
        for region in &mut self.regions {
            region.insert_rows(at, count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    #[test]
    fn parses_and_formats_ranges() {
        assert_eq!(range("$B$1:$K$75"), CellRange::new(1, 2, 75, 11));
        assert_eq!(range("C9:B7").to_string(), "B7:C9");
        assert_eq!(range("D4").to_string(), "D4");
        assert!("B7:".parse::<CellRange>().is_err());
    }

    #[test]
    fn rejects_overlapping_regions() {
        let mut merges = MergeSet::default();
        merges.insert(range("B25:C25")).unwrap();
        let error = merges.insert(range("C25:D25")).unwrap_err();
        assert!(matches!(error, SpreadsheetError::MergeConflict(..)));
        assert!(matches!(merges.insert(range("B26:B26")), Err(SpreadsheetError::InvalidMerge(_))));
        merges.insert(range("D25:E25")).unwrap();
        assert_eq!(merges.len(), 2);
    }

    #[test]
    fn resolves_anchor_cells() {
        let mut merges = MergeSet::default();
        merges.insert(range("B7:K7")).unwrap();
        assert_eq!(merges.anchor_of(7, 5), (7, 2));
        assert_eq!(merges.anchor_of(8, 5), (8, 5));
        assert!(merges.is_covered(7, 11));
        assert!(!merges.is_covered(7, 2));
    }

    #[test]
    fn removes_overlapping_regions() {
        let mut merges = MergeSet::default();
        merges.insert(range("B32:F32")).unwrap();
        merges.insert(range("G32:K32")).unwrap();
        merges.insert(range("B33:C33")).unwrap();
        let removed = merges.remove_overlapping(&CellRange::row_span(32, 2, 11));
        assert_eq!(removed.len(), 2);
        assert_eq!(merges.iter().collect::<Vec<_>>(), vec![&range("B33:C33")]);
        assert!(merges.remove(&range("B33:C33")));
        assert!(!merges.remove(&range("B33:C33")));
    }

    #[test]
    fn row_insertion_moves_and_grows_regions() {
        let mut merges = MergeSet::default();
        merges.insert(range("B5:K5")).unwrap();
        merges.insert(range("B30:C32")).unwrap();
        merges.insert(range("B40:C40")).unwrap();
        merges.insert_rows(31, 3);
        let regions = merges.iter().copied().collect::<Vec<_>>();
        assert_eq!(regions, vec![range("B5:K5"), range("B30:C35"), range("B43:C43")]);
    }
}
