//! Picture anchoring in DrawingML terms.
//!
//! Markers use 0-based rows and columns with offsets in EMU, exactly as they are
//! stored in `xl/drawings/drawing*.xml`.

/// English Metric Units per inch
pub const EMU_PER_INCH: i64 = 914_400;
/// English Metric Units per screen pixel at 96 DPI
pub const EMU_PER_PIXEL: i64 = 9_525;
/// English Metric Units per typographic point
pub const EMU_PER_POINT: i64 = 12_700;

/// One corner of an anchor
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnchorMarker {
    pub col: u16,
    pub col_off: i64,
    pub row: u32,
    pub row_off: i64,
}

impl AnchorMarker {
    pub fn new(col: u16, col_off: i64, row: u32, row_off: i64) -> AnchorMarker {
        AnchorMarker {
            col,
            col_off,
            row,
            row_off,
        }
    }
}

/// How a picture reacts when the cells under it are resized
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EditAs {
    /// Move and size with cells
    #[default]
    TwoCell,
    /// Move but don't size with cells
    OneCell,
    /// Don't move or size with cells
    Absolute,
}

impl EditAs {
    pub fn parse(name: &str) -> EditAs {
        match name {
            "oneCell" => EditAs::OneCell,
            "absolute" => EditAs::Absolute,
            _ => EditAs::TwoCell,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TwoCellAnchor {
    pub from: AnchorMarker,
    pub to: AnchorMarker,
    pub edit_as: EditAs,
}

impl TwoCellAnchor {
    /// Picture width when both corners share a column
    pub fn same_column_width(&self) -> Option<i64> {
        (self.from.col == self.to.col).then(|| self.to.col_off - self.from.col_off)
    }

    /// Picture height when both corners share a row
    pub fn same_row_height(&self) -> Option<i64> {
        (self.from.row == self.to.row).then(|| self.to.row_off - self.from.row_off)
    }

    pub(crate) fn insert_rows(&mut self, at: u32, count: u32) {
        // Markers are 0-based, `at` is 1-based.
        if self.from.row + 1 >= at {
            self.from.row += count;
            self.to.row += count;
        } else if self.to.row + 1 >= at {
            self.to.row += count;
        }
    }
}

/// A picture embedded in a worksheet
#[derive(Clone, Debug, PartialEq)]
pub struct SheetImage {
    /// Encoded picture (PNG for everything the filler inserts)
    pub data: Vec<u8>,
    pub anchor: TwoCellAnchor,
    /// Display size in EMU
    pub width: i64,
    pub height: i64,
    pub description: Option<String>,
}

impl SheetImage {
    /// Creates an image whose display size is taken from a single-cell anchor
    pub fn anchored(data: Vec<u8>, anchor: TwoCellAnchor) -> SheetImage {
        SheetImage {
            data,
            width: anchor.same_column_width().unwrap_or_default(),
            height: anchor.same_row_height().unwrap_or_default(),
            anchor,
            description: None,
        }
    }

    /// Top-left cell as 1-based `(row, col)`
    pub fn top_left(&self) -> (u32, u16) {
        (self.anchor.from.row + 1, self.anchor.from.col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_insertion_moves_anchors_at_or_below_the_insertion_point() {
        let mut anchor = TwoCellAnchor {
            from: AnchorMarker::new(1, 0, 30, 0),
            to: AnchorMarker::new(1, 100, 30, 100),
            edit_as: EditAs::OneCell,
        };
        anchor.insert_rows(32, 2);
        assert_eq!(anchor.from.row, 30);
        anchor.insert_rows(31, 2);
        assert_eq!((anchor.from.row, anchor.to.row), (32, 32));
    }

    #[test]
    fn single_cell_anchor_defines_the_picture_size() {
        let anchor = TwoCellAnchor {
            from: AnchorMarker::new(3, 0, 6, 0),
            to: AnchorMarker::new(3, 4_507_992, 6, 3_383_280),
            edit_as: EditAs::OneCell,
        };
        let image = SheetImage::anchored(vec![1, 2, 3], anchor);
        assert_eq!((image.width, image.height), (4_507_992, 3_383_280));
        assert_eq!(image.top_left(), (7, 4));
    }
}
