//! The photo reference sheet.
//!
//! Entries are stacked as fixed four-row blocks cloned from the template block
//! (padding, picture row, padding, captions). A heading row is cloned in front of
//! every new section, and a manual page break keeps each printed page to at most
//! `entries_per_page` entries.
use crate::error::SiteSheetError;
use crate::images::placement::place_image;
use crate::images::placement::IMAGE_ROW_HEIGHT;
use crate::images::ImageCache;
use crate::images::Rasterize;
use crate::report::geometry::ReferenceGeometry;
use crate::report::input::ReferenceEntry;
use crate::report::templates::copy_merged_cells;
use crate::report::templates::copy_row;
use crate::spreadsheet::style::Alignment;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Worksheet;

/// Summary of a filled reference sheet
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceLayout {
    pub entries: usize,
    pub sections: usize,
    pub images: usize,
    /// Manual breaks in insertion order
    pub breaks: Vec<u32>,
    /// First row below the last entry block
    pub next_row: u32,
}

/// Clones the template entry block to `row` unless it already sits there, and
/// makes the picture row tall enough for the picture box.
fn prepare_entry_block(sheet: &mut Worksheet, row: u32, geometry: &ReferenceGeometry) -> Result<(), SpreadsheetError> {
    if row != geometry.entry_start {
        for template_row in geometry.entry_start..=geometry.entry_end {
            copy_row(sheet, template_row, row + (template_row - geometry.entry_start));
        }
        copy_merged_cells(sheet, geometry.entry_start, geometry.entry_end, row - geometry.entry_start)?;
    }
    sheet.set_row_height(row + geometry.image_row_offset, Some(IMAGE_ROW_HEIGHT));
    Ok(())
}

fn add_break(sheet: &mut Worksheet, layout: &mut ReferenceLayout, row: u32) {
    log::debug!("Page break after row {row}");
    sheet.add_row_break(row);
    layout.breaks.push(row);
}

/// Lays out the photo entries below the sheet title.
///
/// # Arguments
/// * `sheet` - Reference worksheet of the template
/// * `entries` - Entries in print order; consecutive equal `section_title`s share a heading
/// * `title` - Sheet title, printed as `◙ {title}`
/// * `cache` - Picture cache of the current request
/// * `geometry` - Template rows and columns
///
/// # Returns
/// The layout summary, or an error when a picture needs a converter that is not
/// available or a cloned merge region cannot be created
pub fn fill_reference_sheet<R: Rasterize>(
    sheet: &mut Worksheet,
    entries: &[ReferenceEntry],
    title: &str,
    cache: &mut ImageCache<R>,
    geometry: &ReferenceGeometry,
) -> Result<ReferenceLayout, SiteSheetError> {
    let (title_row, title_col) = geometry.title_cell;
    sheet.set_value(title_row, title_col, format!("◙ {title}"));
    sheet.style_mut(title_row, 1).alignment = Alignment::centered();

    let mut layout = ReferenceLayout::default();
    let mut current_row = geometry.entry_start;
    let mut last_section: Option<&str> = None;
    let mut entries_on_page = 0u32;

    for entry in entries {
        let section = entry.section_title.as_str();
        if !section.is_empty() && last_section != Some(section) {
            if let Some(previous) = last_section {
                if entries_on_page >= geometry.entries_per_page {
                    add_break(sheet, &mut layout, current_row - 1);
                    entries_on_page = 0;
                }
                log::debug!("Section '{section}' after '{previous}' at row {current_row}");
                copy_row(sheet, geometry.heading_row, current_row);
                copy_merged_cells(sheet, geometry.heading_row, geometry.heading_row, current_row - geometry.heading_row)?;
                sheet.set_value(current_row, 2, section);
                current_row += 1;
            } else {
                sheet.set_value(geometry.heading_row, 2, section);
            }
            last_section = Some(section);
            layout.sections += 1;
        }

        if entries_on_page >= geometry.entries_per_page {
            add_break(sheet, &mut layout, current_row - 1);
            entries_on_page = 0;
        }

        prepare_entry_block(sheet, current_row, geometry)?;

        let image_row = current_row + geometry.image_row_offset;
        for (source, col) in entry.images.iter().zip(geometry.image_columns) {
            if source.is_empty() {
                continue;
            }
            if let Some(png) = cache.raster(source)? {
                place_image(sheet, png, image_row, col);
                layout.images += 1;
            }
        }

        let footer_row = current_row + geometry.footer_row_offset;
        for (text, col) in entry.footers.iter().zip(geometry.footer_columns) {
            sheet.set_value(footer_row, col, text.as_str());
        }

        current_row += geometry.entry_height();
        entries_on_page += 1;
        layout.entries += 1;
    }

    let (first, last) = geometry.title_rows;
    sheet.set_print_title_rows(Some((first, last)));
    sheet.page_setup.fit_to_width = Some(1);
    sheet.page_setup.fit_to_height = Some(0);

    layout.next_row = current_row;
    log::info!(
        "Filled reference sheet '{}': {} entries in {} sections, {} images, breaks {:?}",
        sheet.name(),
        layout.entries,
        layout.sections,
        layout.images,
        layout.breaks
    );
    Ok(layout)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::images::placement::IMAGE_BOX_HEIGHT;
    use crate::images::placement::IMAGE_BOX_WIDTH;
    use crate::images::ImageError;
    use crate::images::ImageSource;
    use crate::spreadsheet::cell::CellValue;
    use crate::spreadsheet::merge::CellRange;
    use crate::spreadsheet::style::Color;
    use crate::spreadsheet::style::Fill;
    use std::cell::Cell;

    /// Passes bytes through unchanged and counts the calls
    #[derive(Default)]
    pub(crate) struct PassThrough {
        pub(crate) calls: Cell<usize>,
    }

    impl Rasterize for PassThrough {
        fn rasterize(&self, bytes: &[u8], _name_hint: Option<&str>) -> Result<Vec<u8>, ImageError> {
            self.calls.set(self.calls.get() + 1);
            Ok(bytes.to_vec())
        }
    }

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    /// The reference sheet of the production template
    pub(crate) fn reference_template() -> Worksheet {
        let mut sheet = Worksheet::new("Reference");
        sheet.merge(range("B3:E3")).unwrap();
        sheet.merge(range("B5:E5")).unwrap();
        sheet.set_value(5, 2, "Section");
        sheet.style_mut(5, 2).fill = Fill::solid(Color::Rgb(0x657C9C));
        sheet.set_row_height(6, Some(8.0));
        sheet.merge(range("B9:C9")).unwrap();
        sheet.merge(range("D9:E9")).unwrap();
        sheet.set_value(9, 2, "Caption");
        sheet
    }

    fn entry(section: &str, index: usize) -> ReferenceEntry {
        ReferenceEntry {
            section_title: section.to_owned(),
            images: vec![
                ImageSource::from(format!("data:image/png;base64,{}", ["QUFB", "QkJC", "Q0ND"][index % 3])),
                ImageSource::from("data:image/png;base64,WldY"),
            ],
            footers: vec![format!("Fig {index}a"), format!("Fig {index}b")],
        }
    }

    fn fill(entries: &[ReferenceEntry]) -> (Worksheet, ReferenceLayout, usize) {
        let mut sheet = reference_template();
        let mut cache = ImageCache::with_rasterizer(PassThrough::default());
        let layout = fill_reference_sheet(&mut sheet, entries, "PHOTO REFERENCE", &mut cache, &ReferenceGeometry::default()).unwrap();
        let calls = cache.rasterizer().calls.get();
        (sheet, layout, calls)
    }

    #[test]
    fn nine_entries_break_twice() {
        let entries: Vec<_> = (0..9).map(|index| entry("Site A", index)).collect();
        let (sheet, layout, calls) = fill(&entries);
        assert_eq!(layout.breaks, vec![21, 37]);
        assert_eq!(sheet.row_breaks(), vec![21, 37]);
        assert_eq!(layout.sections, 1);
        assert_eq!(layout.next_row, 42);
        assert_eq!(layout.images, 18);
        assert_eq!(calls, 4);
        assert_eq!(sheet.print_title_rows(), Some((1, 4)));
        assert_eq!(sheet.page_setup.fit_to_height, Some(0));
    }

    #[test]
    fn coinciding_section_and_page_boundaries_break_once() {
        let mut entries: Vec<_> = (0..4).map(|index| entry("Site A", index)).collect();
        entries.push(entry("Site B", 4));
        let (sheet, layout, _) = fill(&entries);
        assert_eq!(layout.breaks, vec![21]);
        assert_eq!(layout.sections, 2);
        assert_eq!(sheet.value(22, 2), &CellValue::from("Site B"));
        assert!(sheet.merges().contains(&range("B22:E22")));
        assert_eq!(sheet.style(22, 2).unwrap().fill, Fill::solid(Color::Rgb(0x657C9C)));
        assert_eq!(sheet.images()[8].top_left(), (24, 2));
    }

    #[test]
    fn first_section_reuses_the_heading_row() {
        let entries = vec![entry("Site A", 0), entry("Site B", 1), entry("Site B", 2)];
        let (sheet, layout, _) = fill(&entries);
        assert_eq!(sheet.value(3, 3), &CellValue::from("◙ PHOTO REFERENCE"));
        assert_eq!(sheet.value(5, 2), &CellValue::from("Site A"));
        assert_eq!(sheet.value(10, 2), &CellValue::from("Site B"));
        assert!(layout.breaks.is_empty());
        assert_eq!(layout.next_row, 19);

        assert_eq!(sheet.value(9, 2), &CellValue::from("Fig 0a"));
        assert_eq!(sheet.value(9, 5), &CellValue::from("Fig 0b"));
        assert_eq!(sheet.value(14, 2), &CellValue::from("Fig 1a"));
        assert!(sheet.merges().contains(&range("D14:E14")));
        assert_eq!(sheet.row_height(12), Some(IMAGE_ROW_HEIGHT));
        assert_eq!(sheet.row_height(11), Some(8.0));
    }

    #[test]
    fn pictures_share_one_box_in_the_two_data_columns() {
        let (sheet, _, _) = fill(&[entry("Site A", 0)]);
        let images = sheet.images();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].top_left(), (7, 2));
        assert_eq!(images[1].top_left(), (7, 4));
        for image in images {
            assert_eq!((image.width, image.height), (IMAGE_BOX_WIDTH, IMAGE_BOX_HEIGHT));
        }
    }

    #[test]
    fn blank_and_unreadable_sources_are_skipped() {
        let entries = vec![ReferenceEntry {
            section_title: String::new(),
            images: vec![ImageSource::from(""), ImageSource::from("/missing/photo.jpg"), ImageSource::from("data:image/png;base64,QUFB")],
            footers: vec!["only one".to_owned()],
        }];
        let (sheet, layout, calls) = fill(&entries);
        assert_eq!(layout.images, 0);
        assert_eq!(calls, 0);
        assert_eq!(layout.sections, 0);
        assert_eq!(sheet.value(5, 2), &CellValue::from("Section"));
        assert_eq!(sheet.value(9, 2), &CellValue::from("only one"));
    }
}
