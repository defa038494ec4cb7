//! Row and merge cloning used to grow template blocks.
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::merge::CellRange;
use crate::spreadsheet::style::GENERAL_FORMAT;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Worksheet;

/// Copies one row onto another: height, then value and style of every column.
///
/// A destination cell covered by a merge region keeps its value slot and only
/// receives the style. Source cells without formatting leave the destination
/// style alone.
pub fn copy_row(sheet: &mut Worksheet, src_row: u32, dst_row: u32) {
    if src_row == dst_row {
        return;
    }
    sheet.set_row_height(dst_row, sheet.row_height(src_row));

    for col in 1..=sheet.max_column() {
        let source = sheet.cell(src_row, col).cloned().unwrap_or_default();
        if !sheet.merges().is_covered(dst_row, col) {
            if source.value.is_empty() {
                sheet.clear_value(dst_row, col);
            } else {
                sheet.set_value(dst_row, col, source.value);
            }
        }
        if !source.style.is_default() {
            sheet.set_style(dst_row, col, source.style);
        }
    }
}

/// Re-creates the merge regions whose top row lies in `src_start..=src_end`
/// `offset` rows further down.
///
/// Every destination cell is emptied first and regions already overlapping a
/// destination are unmerged, so the new region always goes in.
///
/// # Returns
/// The destination regions that were created
pub fn copy_merged_cells(sheet: &mut Worksheet, src_start: u32, src_end: u32, offset: u32) -> Result<Vec<CellRange>, SpreadsheetError> {
    if offset == 0 {
        return Ok(Vec::new());
    }
    let regions: Vec<CellRange> = sheet
        .merges()
        .iter()
        .filter(|region| (src_start..=src_end).contains(&region.first_row))
        .copied()
        .collect();

    let mut created = Vec::with_capacity(regions.len());
    for region in regions {
        let target = region.shifted(offset);
        for (row, col) in target.cells() {
            sheet.clear_value(row, col);
        }
        merge_replacing(sheet, target)?;
        created.push(target);
    }
    Ok(created)
}

/// Copies font, border, fill, number format and alignment of one cell onto another.
/// Protection and value stay untouched; an unformatted source changes nothing.
///
/// # Returns
/// Whether anything was copied
pub fn copy_cell_style(sheet: &mut Worksheet, src: (u32, u16), dst: (u32, u16)) -> bool {
    let source = match sheet.style(src.0, src.1) {
        Some(style) if !style.is_default() => style.clone(),
        _ => return false,
    };
    let target = sheet.style_mut(dst.0, dst.1);
    target.font = source.font;
    target.border = source.border;
    target.fill = source.fill;
    target.number_format = source.number_format;
    target.alignment = source.alignment;
    true
}

/// [`copy_cell_style`] without the number format: the destination keeps its own
pub fn copy_cell_style_keeping_format(sheet: &mut Worksheet, src: (u32, u16), dst: (u32, u16)) {
    let kept = sheet
        .style(dst.0, dst.1)
        .map_or_else(|| GENERAL_FORMAT.to_owned(), |style| style.number_format.clone());
    if copy_cell_style(sheet, src, dst) {
        sheet.style_mut(dst.0, dst.1).number_format = kept;
    }
}

/// Merges a region after removing every region it overlaps.
///
/// # Returns
/// The regions that had to be unmerged
pub fn merge_replacing(sheet: &mut Worksheet, range: CellRange) -> Result<Vec<CellRange>, SpreadsheetError> {
    if sheet.merges().contains(&range) {
        return Ok(Vec::new());
    }
    let removed = sheet.unmerge_overlapping(&range);
    sheet.merge(range)?;
    Ok(removed)
}

/// Writes a value, or empties the slot for blank text
pub(crate) fn write_text(sheet: &mut Worksheet, row: u32, col: u16, text: &str) {
    if text.is_empty() {
        sheet.set_value(row, col, CellValue::Empty);
    } else {
        sheet.set_value(row, col, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::style::Color;
    use crate::spreadsheet::style::Fill;
    use crate::spreadsheet::style::Font;

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    fn entry_template() -> Worksheet {
        let mut sheet = Worksheet::new("Reference");
        sheet.set_row_height(7, Some(150.0));
        sheet.merge(range("B9:C9")).unwrap();
        sheet.set_value(9, 2, "Caption");
        sheet.style_mut(9, 2).fill = Fill::solid(Color::Rgb(0xDDEBF7));
        sheet.set_value(9, 4, "Caption");
        sheet.set_value(6, 5, "pad");
        sheet
    }

    #[test]
    fn copies_values_styles_and_height() {
        let mut sheet = entry_template();
        copy_row(&mut sheet, 7, 11);
        copy_row(&mut sheet, 9, 13);
        assert_eq!(sheet.row_height(11), Some(150.0));
        assert_eq!(sheet.value(13, 2), &CellValue::from("Caption"));
        assert_eq!(sheet.value(13, 4), &CellValue::from("Caption"));
        assert_eq!(sheet.style(13, 2).unwrap().fill, Fill::solid(Color::Rgb(0xDDEBF7)));
    }

    #[test]
    fn covered_destinations_only_take_styles() {
        let mut sheet = entry_template();
        sheet.merge(range("D13:E13")).unwrap();
        sheet.set_value(9, 5, "hidden");
        sheet.style_mut(9, 5).font = Font::new("Arial", 9.0);
        copy_row(&mut sheet, 9, 13);
        assert!(sheet.cell(13, 5).unwrap().value.is_empty());
        assert_eq!(sheet.style(13, 5).unwrap().font, Font::new("Arial", 9.0));
        assert_eq!(sheet.value(13, 4), &CellValue::from("Caption"));
    }

    #[test]
    fn translated_merges_start_empty() {
        let mut sheet = entry_template();
        for row in 6..=9 {
            copy_row(&mut sheet, row, row + 4);
        }
        let created = copy_merged_cells(&mut sheet, 6, 9, 4).unwrap();
        assert_eq!(created, vec![range("B13:C13")]);
        assert!(sheet.merges().contains(&range("B13:C13")));
        assert_eq!(sheet.value(13, 2), &CellValue::Empty);
        assert_eq!(sheet.value(9, 2), &CellValue::from("Caption"));
        assert_eq!(sheet.value(10, 5), &CellValue::from("pad"));
    }

    #[test]
    fn translated_merges_replace_overlapping_regions() {
        let mut sheet = entry_template();
        sheet.merge(range("C13:D13")).unwrap();
        copy_merged_cells(&mut sheet, 9, 9, 4).unwrap();
        assert!(sheet.merges().contains(&range("B13:C13")));
        assert!(!sheet.merges().contains(&range("C13:D13")));
        assert!(copy_merged_cells(&mut sheet, 9, 9, 0).unwrap().is_empty());
    }

    #[test]
    fn cell_style_copy_keeps_protection() {
        let mut sheet = entry_template();
        sheet.style_mut(20, 2).protection.locked = false;
        copy_cell_style(&mut sheet, (9, 2), (20, 2));
        let style = sheet.style(20, 2).unwrap();
        assert_eq!(style.fill, Fill::solid(Color::Rgb(0xDDEBF7)));
        assert!(!style.protection.locked);

        assert!(!copy_cell_style(&mut sheet, (50, 2), (21, 2)));
        assert!(sheet.cell(21, 2).is_none());
    }

    #[test]
    fn format_keeping_copy_leaves_the_number_format() {
        let mut sheet = entry_template();
        sheet.style_mut(9, 2).number_format = "0.00".to_owned();
        sheet.style_mut(20, 2).number_format = "#,##0".to_owned();
        copy_cell_style_keeping_format(&mut sheet, (9, 2), (20, 2));
        copy_cell_style_keeping_format(&mut sheet, (9, 2), (21, 2));

        let kept = sheet.style(20, 2).unwrap();
        assert_eq!(kept.fill, Fill::solid(Color::Rgb(0xDDEBF7)));
        assert_eq!(kept.number_format, "#,##0");
        assert_eq!(sheet.style(21, 2).unwrap().number_format, GENERAL_FORMAT);

        copy_cell_style_keeping_format(&mut sheet, (50, 2), (22, 2));
        assert!(sheet.cell(22, 2).is_none());
    }

    #[test]
    fn merge_replacing_reports_removed_regions() {
        let mut sheet = Worksheet::new("Report");
        sheet.merge(range("B26:D26")).unwrap();
        let removed = merge_replacing(&mut sheet, range("B26:C26")).unwrap();
        assert_eq!(removed, vec![range("B26:D26")]);
        assert!(merge_replacing(&mut sheet, range("B26:C26")).unwrap().is_empty());
        assert!(matches!(
            merge_replacing(&mut sheet, range("B27:B27")),
            Err(SpreadsheetError::InvalidMerge(_))
        ));
    }
}
