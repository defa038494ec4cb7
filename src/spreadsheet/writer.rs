//! Exports the document model through `rust_xlsxwriter`.
use crate::error::SiteSheetError;
use crate::spreadsheet::cell::to_excel_serial;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::drawing::EditAs;
use crate::spreadsheet::drawing::SheetImage;
use crate::spreadsheet::drawing::EMU_PER_PIXEL;
use crate::spreadsheet::page::Orientation;
use crate::spreadsheet::page::SheetViewMode;
use crate::spreadsheet::style::BorderStyle;
use crate::spreadsheet::style::CellStyle;
use crate::spreadsheet::style::Color;
use crate::spreadsheet::style::FillPattern;
use crate::spreadsheet::style::HorizontalAlignment;
use crate::spreadsheet::style::VerticalAlignment;
use crate::spreadsheet::style::GENERAL_FORMAT;
use crate::spreadsheet::Workbook;
use crate::spreadsheet::Worksheet;
use rust_xlsxwriter::Format;
use rust_xlsxwriter::FormatAlign;
use rust_xlsxwriter::FormatBorder;
use rust_xlsxwriter::FormatPattern;
use rust_xlsxwriter::FormatUnderline;
use rust_xlsxwriter::Image;
use rust_xlsxwriter::ObjectMovement;

/// Number format used for native dates that carry no format of their own
const DEFAULT_DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Serializes a workbook into `.xlsx` bytes
pub(super) fn write_workbook(model: &Workbook) -> Result<Vec<u8>, SiteSheetError> {
    let mut workbook = rust_xlsxwriter::Workbook::new();
    for (index, sheet) in model.worksheets().iter().enumerate() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet.name())?;
        write_worksheet(worksheet, sheet)?;
        worksheet.set_selected(sheet.view.tab_selected);
        if index == model.active() {
            worksheet.set_active(true);
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn write_worksheet(worksheet: &mut rust_xlsxwriter::Worksheet, sheet: &Worksheet) -> Result<(), SiteSheetError> {
    if let Some(height) = sheet.default_row_height {
        worksheet.set_default_row_height(height);
    }
    for (&col, &width) in sheet.column_widths() {
        worksheet.set_column_width(col - 1, to_user_width(width))?;
    }
    for (&row, &height) in sheet.row_heights() {
        worksheet.set_row_height(row - 1, height)?;
    }
    for (&col, style) in sheet.column_styles() {
        worksheet.set_column_format(col - 1, &to_format(style))?;
    }
    for (&row, style) in sheet.row_styles() {
        worksheet.set_row_format(row - 1, &to_format(style))?;
    }
    for &col in sheet.hidden_columns() {
        worksheet.set_column_hidden(col - 1)?;
    }
    for &row in sheet.hidden_rows() {
        worksheet.set_row_hidden(row - 1)?;
    }

    // Merges first; cell writes afterwards replace the placeholders they leave.
    for region in sheet.merges().iter() {
        let format = sheet
            .style(region.first_row, region.first_col)
            .map(to_format)
            .unwrap_or_default();
        worksheet.merge_range(
            region.first_row - 1,
            region.first_col - 1,
            region.last_row - 1,
            region.last_col - 1,
            "",
            &format,
        )?;
    }

    for (&(row, col), cell) in sheet.cells() {
        let (row, col) = (row - 1, col - 1);
        let mut format = to_format(&cell.style);
        match &cell.value {
            CellValue::Empty => {
                worksheet.write_blank(row, col, &format)?;
            }
            CellValue::Text(text) => {
                worksheet.write_string_with_format(row, col, text, &format)?;
            }
            CellValue::Number(number) => {
                worksheet.write_number_with_format(row, col, *number, &format)?;
            }
            CellValue::Boolean(value) => {
                worksheet.write_boolean_with_format(row, col, *value, &format)?;
            }
            CellValue::Formula(formula) => {
                worksheet.write_formula_with_format(row, col, formula.as_str(), &format)?;
            }
            CellValue::DateTime(datetime) => {
                if cell.style.number_format == GENERAL_FORMAT {
                    format = format.set_num_format(DEFAULT_DATETIME_FORMAT);
                }
                worksheet.write_number_with_format(row, col, to_excel_serial(datetime), &format)?;
            }
        }
    }

    for image in sheet.images() {
        write_image(worksheet, image)?;
    }

    write_page_setup(worksheet, sheet)?;
    Ok(())
}

fn write_image(worksheet: &mut rust_xlsxwriter::Worksheet, image: &SheetImage) -> Result<(), SiteSheetError> {
    let movement = match image.anchor.edit_as {
        EditAs::TwoCell => ObjectMovement::MoveAndSizeWithCells,
        EditAs::OneCell => ObjectMovement::MoveButDontSizeWithCells,
        EditAs::Absolute => ObjectMovement::DontMoveOrSizeWithCells,
    };
    let mut picture = Image::new_from_buffer(&image.data)?.set_object_movement(movement);
    if image.width > 0 && image.height > 0 {
        let width = image.width as f64 / EMU_PER_PIXEL as f64;
        let height = image.height as f64 / EMU_PER_PIXEL as f64;
        picture = picture.set_scale_to_size(width, height, false);
    }
    if let Some(description) = &image.description {
        picture = picture.set_alt_text(description);
    }

    let from = image.anchor.from;
    let x_offset = (from.col_off.max(0) / EMU_PER_PIXEL) as u32;
    let y_offset = (from.row_off.max(0) / EMU_PER_PIXEL) as u32;
    worksheet.insert_image_with_offset(from.row, from.col, &picture, x_offset, y_offset)?;
    Ok(())
}

fn write_page_setup(worksheet: &mut rust_xlsxwriter::Worksheet, sheet: &Worksheet) -> Result<(), SiteSheetError> {
    let setup = &sheet.page_setup;
    match setup.orientation {
        Some(Orientation::Portrait) => {
            worksheet.set_portrait();
        }
        Some(Orientation::Landscape) => {
            worksheet.set_landscape();
        }
        None => (),
    }
    if let Some(paper_size) = setup.paper_size {
        worksheet.set_paper_size(paper_size);
    }
    if setup.fit_to_page {
        worksheet.set_print_fit_to_pages(setup.fit_to_width.unwrap_or(1), setup.fit_to_height.unwrap_or(1));
    } else if let Some(scale) = setup.scale {
        worksheet.set_print_scale(scale);
    }
    worksheet.set_print_center_horizontally(setup.center_horizontally);
    worksheet.set_print_center_vertically(setup.center_vertically);
    if let Some(header) = &setup.header {
        worksheet.set_header(header);
    }
    if let Some(footer) = &setup.footer {
        worksheet.set_footer(footer);
    }
    if let Some(margins) = setup.margins {
        worksheet.set_margins(margins.left, margins.right, margins.top, margins.bottom, margins.header, margins.footer);
    }

    if let Some(area) = sheet.print_area() {
        worksheet.set_print_area(area.first_row - 1, area.first_col - 1, area.last_row - 1, area.last_col - 1)?;
    }
    if let Some((first, last)) = sheet.print_title_rows() {
        worksheet.set_repeat_rows(first - 1, last - 1)?;
    }
    let breaks = sheet.row_breaks();
    if !breaks.is_empty() {
        worksheet.set_page_breaks(&breaks)?;
    }

    match sheet.view.mode {
        SheetViewMode::Normal => (),
        SheetViewMode::PageBreakPreview => {
            worksheet.set_view_page_break_preview();
        }
        SheetViewMode::PageLayout => {
            worksheet.set_view_page_layout();
        }
    }
    if let Some(zoom) = sheet.view.zoom {
        worksheet.set_zoom(zoom);
    }
    if !sheet.view.show_grid_lines {
        worksheet.set_screen_gridlines(false);
    }
    Ok(())
}

/// Converts a stored `<col width>` back to the width a user would type,
/// which is what `set_column_width` expects
fn to_user_width(width: f64) -> f64 {
    const PADDING: f64 = 5.0 / 7.0;
    if width > 1.0 + PADDING {
        width - PADDING
    } else {
        width * 7.0 / 12.0
    }
}

/// Builds the writer format equivalent to a cell style
pub(super) fn to_format(style: &CellStyle) -> Format {
    let mut format = Format::new();

    let font = &style.font;
    if let Some(name) = &font.name {
        format = format.set_font_name(name);
    }
    if let Some(size) = font.size {
        format = format.set_font_size(size);
    }
    if font.bold {
        format = format.set_bold();
    }
    if font.italic {
        format = format.set_italic();
    }
    if font.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    if font.strike {
        format = format.set_font_strikethrough();
    }
    if let Some(color) = font.color.and_then(to_color) {
        format = format.set_font_color(color);
    }

    let fill = &style.fill;
    if fill.pattern != FillPattern::None {
        format = format.set_pattern(to_pattern(fill.pattern));
        if let Some(color) = fill.foreground.and_then(to_color) {
            format = format.set_foreground_color(color);
        }
        if let Some(color) = fill.background.and_then(to_color) {
            format = format.set_background_color(color);
        }
    }

    let border = &style.border;
    if border.left.style != BorderStyle::None {
        format = format.set_border_left(to_border(border.left.style));
        if let Some(color) = border.left.color.and_then(to_color) {
            format = format.set_border_left_color(color);
        }
    }
    if border.right.style != BorderStyle::None {
        format = format.set_border_right(to_border(border.right.style));
        if let Some(color) = border.right.color.and_then(to_color) {
            format = format.set_border_right_color(color);
        }
    }
    if border.top.style != BorderStyle::None {
        format = format.set_border_top(to_border(border.top.style));
        if let Some(color) = border.top.color.and_then(to_color) {
            format = format.set_border_top_color(color);
        }
    }
    if border.bottom.style != BorderStyle::None {
        format = format.set_border_bottom(to_border(border.bottom.style));
        if let Some(color) = border.bottom.color.and_then(to_color) {
            format = format.set_border_bottom_color(color);
        }
    }

    let alignment = &style.alignment;
    let horizontal = match alignment.horizontal {
        HorizontalAlignment::General => None,
        HorizontalAlignment::Left => Some(FormatAlign::Left),
        HorizontalAlignment::Center => Some(FormatAlign::Center),
        HorizontalAlignment::Right => Some(FormatAlign::Right),
        HorizontalAlignment::Fill => Some(FormatAlign::Fill),
        HorizontalAlignment::Justify => Some(FormatAlign::Justify),
        HorizontalAlignment::CenterContinuous => Some(FormatAlign::CenterAcross),
        HorizontalAlignment::Distributed => Some(FormatAlign::Distributed),
    };
    if let Some(align) = horizontal {
        format = format.set_align(align);
    }
    let vertical = match alignment.vertical {
        VerticalAlignment::Bottom => None,
        VerticalAlignment::Top => Some(FormatAlign::Top),
        VerticalAlignment::Center => Some(FormatAlign::VerticalCenter),
        VerticalAlignment::Justify => Some(FormatAlign::VerticalJustify),
        VerticalAlignment::Distributed => Some(FormatAlign::VerticalDistributed),
    };
    if let Some(align) = vertical {
        format = format.set_align(align);
    }
    if alignment.wrap_text {
        format = format.set_text_wrap();
    }
    if alignment.shrink_to_fit {
        format = format.set_shrink();
    }
    if alignment.indent > 0 {
        format = format.set_indent(alignment.indent);
    }
    if alignment.rotation != 0 {
        format = format.set_rotation(alignment.rotation);
    }

    if style.number_format != GENERAL_FORMAT {
        format = format.set_num_format(&style.number_format);
    }
    if !style.protection.locked {
        format = format.set_unlocked();
    }
    if style.protection.hidden {
        format = format.set_hidden();
    }
    format
}

fn to_color(color: Color) -> Option<rust_xlsxwriter::Color> {
    match color {
        Color::Rgb(rgb) => Some(rust_xlsxwriter::Color::RGB(rgb)),
        Color::Theme(theme, tint) => {
            let theme = theme.min(9);
            Some(rust_xlsxwriter::Color::Theme(theme, theme_shade(theme, tint)))
        }
        Color::Indexed(_) => color.to_rgb().map(rust_xlsxwriter::Color::RGB),
        Color::Automatic => Some(rust_xlsxwriter::Color::Automatic),
    }
}

/// Picks the palette shade whose tint is closest to `tint`.
///
/// The palette offers five shades per theme column; the first two columns
/// (background and text) and the third use their own tint ladders.
fn theme_shade(theme: u8, tint: f64) -> u8 {
    const BACKGROUND: [f64; 6] = [0.0, -0.0499893, -0.1499985, -0.2499771, -0.3499863, -0.4999847];
    const TEXT: [f64; 6] = [0.0, 0.4999847, 0.3499863, 0.2499771, 0.1499985, 0.0499893];
    const BACKGROUND_2: [f64; 6] = [0.0, -0.0999786, -0.2499771, -0.4999847, -0.7499924, -0.8999908];
    const ACCENT: [f64; 6] = [0.0, 0.7999817, 0.5999939, 0.3999756, -0.2499771, -0.4999847];
    let ladder = match theme {
        0 => &BACKGROUND,
        1 => &TEXT,
        2 => &BACKGROUND_2,
        _ => &ACCENT,
    };
    let mut best = 0;
    for (shade, step) in ladder.iter().enumerate() {
        if (step - tint).abs() < (ladder[best] - tint).abs() {
            best = shade;
        }
    }
    best as u8
}

fn to_pattern(pattern: FillPattern) -> FormatPattern {
    match pattern {
        FillPattern::None => FormatPattern::None,
        FillPattern::Solid => FormatPattern::Solid,
        FillPattern::MediumGray => FormatPattern::MediumGray,
        FillPattern::DarkGray => FormatPattern::DarkGray,
        FillPattern::LightGray => FormatPattern::LightGray,
        FillPattern::DarkHorizontal => FormatPattern::DarkHorizontal,
        FillPattern::DarkVertical => FormatPattern::DarkVertical,
        FillPattern::DarkDown => FormatPattern::DarkDown,
        FillPattern::DarkUp => FormatPattern::DarkUp,
        FillPattern::DarkGrid => FormatPattern::DarkGrid,
        FillPattern::DarkTrellis => FormatPattern::DarkTrellis,
        FillPattern::LightHorizontal => FormatPattern::LightHorizontal,
        FillPattern::LightVertical => FormatPattern::LightVertical,
        FillPattern::LightDown => FormatPattern::LightDown,
        FillPattern::LightUp => FormatPattern::LightUp,
        FillPattern::LightGrid => FormatPattern::LightGrid,
        FillPattern::LightTrellis => FormatPattern::LightTrellis,
        FillPattern::Gray125 => FormatPattern::Gray125,
        FillPattern::Gray0625 => FormatPattern::Gray0625,
    }
}

fn to_border(style: BorderStyle) -> FormatBorder {
    match style {
        BorderStyle::None => FormatBorder::None,
        BorderStyle::Thin => FormatBorder::Thin,
        BorderStyle::Medium => FormatBorder::Medium,
        BorderStyle::Dashed => FormatBorder::Dashed,
        BorderStyle::Dotted => FormatBorder::Dotted,
        BorderStyle::Thick => FormatBorder::Thick,
        BorderStyle::Double => FormatBorder::Double,
        BorderStyle::Hair => FormatBorder::Hair,
        BorderStyle::MediumDashed => FormatBorder::MediumDashed,
        BorderStyle::DashDot => FormatBorder::DashDot,
        BorderStyle::MediumDashDot => FormatBorder::MediumDashDot,
        BorderStyle::DashDotDot => FormatBorder::DashDotDot,
        BorderStyle::MediumDashDotDot => FormatBorder::MediumDashDotDot,
        BorderStyle::SlantDashDot => FormatBorder::SlantDashDot,
    }
}
