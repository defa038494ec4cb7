//! Fixed-size picture boxes for the photo reference sheet.
use crate::spreadsheet::drawing::AnchorMarker;
use crate::spreadsheet::drawing::EditAs;
use crate::spreadsheet::drawing::SheetImage;
use crate::spreadsheet::drawing::TwoCellAnchor;
use crate::spreadsheet::Worksheet;

/// Picture box width: 4.93 in
pub const IMAGE_BOX_WIDTH: i64 = 4_507_992;
/// Picture box height: 3.7 in
pub const IMAGE_BOX_HEIGHT: i64 = 3_383_280;
/// Height in points of the row that carries the pictures (3.7 in)
pub const IMAGE_ROW_HEIGHT: f64 = 267.0;

/// Anchor for a picture whose top-left corner sits on the 1-based cell `(row, col)`.
///
/// Both markers stay in the same cell; the box size lives entirely in the `to`
/// offsets, so every picture is stretched to the same box whatever its pixel size.
pub fn image_anchor(row: u32, col: u16) -> TwoCellAnchor {
    let (row, col) = (row.saturating_sub(1), col.saturating_sub(1));
    TwoCellAnchor {
        from: AnchorMarker::new(col, 0, row, 0),
        to: AnchorMarker::new(col, IMAGE_BOX_WIDTH, row, IMAGE_BOX_HEIGHT),
        edit_as: EditAs::OneCell,
    }
}

/// Adds PNG bytes to a worksheet in the fixed picture box at `(row, col)`
pub fn place_image(sheet: &mut Worksheet, png: Vec<u8>, row: u32, col: u16) {
    sheet.add_image(SheetImage::anchored(png, image_anchor(row, col)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::drawing::EMU_PER_INCH;

    #[test]
    fn box_matches_the_template_footprint() {
        assert_eq!(IMAGE_BOX_WIDTH, (4.93 * EMU_PER_INCH as f64) as i64);
        assert_eq!(IMAGE_BOX_HEIGHT, (3.7 * EMU_PER_INCH as f64) as i64);
    }

    #[test]
    fn anchors_are_zero_based_and_identical_in_size() {
        let left = image_anchor(7, 2);
        let right = image_anchor(7, 4);
        assert_eq!(left.from, AnchorMarker::new(1, 0, 6, 0));
        assert_eq!(right.to, AnchorMarker::new(3, IMAGE_BOX_WIDTH, 6, IMAGE_BOX_HEIGHT));
        assert_eq!(left.same_column_width(), right.same_column_width());
        assert_eq!(left.same_row_height(), right.same_row_height());
        assert_eq!(left.edit_as, EditAs::OneCell);
    }

    #[test]
    fn placed_images_carry_the_box_size() {
        let mut sheet = Worksheet::new("Reference");
        place_image(&mut sheet, vec![0x89, b'P'], 7, 4);
        let image = &sheet.images()[0];
        assert_eq!(image.top_left(), (7, 4));
        assert_eq!((image.width, image.height), (IMAGE_BOX_WIDTH, IMAGE_BOX_HEIGHT));
    }
}
