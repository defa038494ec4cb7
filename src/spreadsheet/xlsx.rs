use crate::error::ResultMessage;
use crate::error::SiteSheetError;
use crate::helpers::reader::UnifiedReader;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::drawing::AnchorMarker;
use crate::spreadsheet::drawing::EditAs;
use crate::spreadsheet::drawing::SheetImage;
use crate::spreadsheet::drawing::TwoCellAnchor;
use crate::spreadsheet::drawing::EMU_PER_PIXEL;
use crate::spreadsheet::drawing::EMU_PER_POINT;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::excel::split_part;
use crate::spreadsheet::merge::CellRange;
use crate::spreadsheet::page::Margins;
use crate::spreadsheet::page::Orientation;
use crate::spreadsheet::page::SheetViewMode;
use crate::spreadsheet::reference::parse_reference;
use crate::spreadsheet::reference::shift_formula;
use crate::spreadsheet::style::builtin_number_format;
use crate::spreadsheet::style::Alignment;
use crate::spreadsheet::style::Border;
use crate::spreadsheet::style::BorderEdge;
use crate::spreadsheet::style::BorderStyle;
use crate::spreadsheet::style::CellStyle;
use crate::spreadsheet::style::Color;
use crate::spreadsheet::style::Fill;
use crate::spreadsheet::style::FillPattern;
use crate::spreadsheet::style::Font;
use crate::spreadsheet::style::HorizontalAlignment;
use crate::spreadsheet::style::Protection;
use crate::spreadsheet::style::VerticalAlignment;
use crate::spreadsheet::style::GENERAL_FORMAT;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::spreadsheet::Worksheet;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use regex::Regex;
use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::LazyLock;
use zip::ZipArchive;

// XML local names used by the workbook, shared strings and worksheet parts
const TAG_SHEET: &[u8] = b"sheet";                       // Worksheet definition
const TAG_WORKBOOK_VIEW: &[u8] = b"workbookView";        // Workbook window settings
const TAG_DEFINED_NAME: &[u8] = b"definedName";          // Named range (print area, titles)
const TAG_SHARED_STRING_ITEM: &[u8] = b"si";             // Shared string table item
const TAG_PHONETIC_TEXT: &[u8] = b"rPh";                 // Phonetic text for Asian languages
const TAG_TEXT: &[u8] = b"t";                            // Text content within strings
const TAG_PAGE_SETUP_PROPERTIES: &[u8] = b"pageSetUpPr"; // Fit-to-page flag
const TAG_SHEET_VIEW: &[u8] = b"sheetView";              // Sheet window settings
const TAG_SHEET_FORMAT: &[u8] = b"sheetFormatPr";        // Default row height
const TAG_COLUMN: &[u8] = b"col";                        // Column dimensions
const TAG_ROW: &[u8] = b"row";                           // Row in worksheet
const TAG_CELL: &[u8] = b"c";                            // Cell in worksheet
const TAG_FORMULA: &[u8] = b"f";                         // Cell formula
const TAG_INLINE_STRING: &[u8] = b"is";                  // Inline string value
const TAG_VALUE: &[u8] = b"v";                           // Cell value content
const TAG_MERGE_CELL: &[u8] = b"mergeCell";              // Merged region
const TAG_PRINT_OPTIONS: &[u8] = b"printOptions";        // Centering on the page
const TAG_PAGE_MARGINS: &[u8] = b"pageMargins";          // Margins in inches
const TAG_PAGE_SETUP: &[u8] = b"pageSetup";              // Paper, orientation, fit-to
const TAG_ROW_BREAKS: &[u8] = b"rowBreaks";              // Manual horizontal page breaks
const TAG_BREAK: &[u8] = b"brk";                         // Single page break
const TAG_ODD_HEADER: &[u8] = b"oddHeader";              // Page header text
const TAG_ODD_FOOTER: &[u8] = b"oddFooter";              // Page footer text
const TAG_DRAWING: &[u8] = b"drawing";                   // Reference to the drawing part

// XML local names used by styles.xml
const TAG_NUMBER_FORMATS: &[u8] = b"numFmts";
const TAG_NUMBER_FORMAT: &[u8] = b"numFmt";
const TAG_FONTS: &[u8] = b"fonts";
const TAG_FONT: &[u8] = b"font";
const TAG_FILLS: &[u8] = b"fills";
const TAG_FILL: &[u8] = b"fill";
const TAG_PATTERN_FILL: &[u8] = b"patternFill";
const TAG_BORDERS: &[u8] = b"borders";
const TAG_BORDER: &[u8] = b"border";
const TAG_CELL_FORMATS: &[u8] = b"cellXfs";
const TAG_CELL_FORMAT: &[u8] = b"xf";
const TAG_ALIGNMENT: &[u8] = b"alignment";
const TAG_PROTECTION: &[u8] = b"protection";
const TAG_COLOR: &[u8] = b"color";

// XML local names used by drawing parts
const TAG_TWO_CELL_ANCHOR: &[u8] = b"twoCellAnchor";
const TAG_ONE_CELL_ANCHOR: &[u8] = b"oneCellAnchor";
const TAG_FROM: &[u8] = b"from";
const TAG_TO: &[u8] = b"to";
const TAG_EXTENT: &[u8] = b"ext";
const TAG_BLIP: &[u8] = b"blip";
const TAG_NON_VISUAL_PROPERTIES: &[u8] = b"cNvPr";

/// Column dimensions past this index are not carried into the model
const MAX_DIMENSIONED_COLUMN: u16 = 256;

static TITLE_ROWS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\$?(\d+):\$?(\d+)$").expect("Hardcode regex pattern"));

/// Reads a whole workbook package into the document model
///
/// # Arguments
/// * `reader` - Package bytes, on disk or in memory
/// * `file_name` - Name used in error messages
pub(super) fn read_workbook(reader: UnifiedReader, file_name: &str) -> Result<Workbook, SiteSheetError> {
    let mut zip = ZipArchive::new(reader)?;
    let part = load_workbook(&mut zip)?;
    if part.sheets.is_empty() {
        Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
    }

    let shared_strings = load_shared_strings(&mut zip)?;
    let styles = load_styles(&mut zip)?;

    let mut workbook = Workbook::new();
    for (index, (name, path)) in part.sheets.iter().enumerate() {
        let mut sheet = Worksheet::new(name);
        let prefix = format!("Read worksheet '{name}' of '{file_name}'");
        let drawing_id = load_worksheet(&mut zip, path, &mut sheet, &shared_strings, &styles).with_prefix(&prefix)?;
        if let Some(id) = drawing_id {
            load_drawing(&mut zip, path, &id, &mut sheet).with_prefix(&prefix)?;
        }
        for defined_name in part.defined_names.iter().filter(|defined_name| defined_name.sheet_index == Some(index)) {
            apply_defined_name(&mut sheet, defined_name);
        }
        log::debug!(
            "Loaded worksheet '{name}': {} merges, {} images, {} page breaks",
            sheet.merges().len(),
            sheet.images().len(),
            sheet.row_breaks().len(),
        );
        workbook.add_worksheet(sheet);
    }

    let active = part.active_tab.min(part.sheets.len() - 1);
    workbook.set_active(active)?;
    Ok(workbook)
}

/// Sheet list and workbook-level settings from `xl/workbook.xml`
struct WorkbookPart {
    /// (name, zip_path) pairs in tab order
    sheets: Vec<(String, String)>,
    active_tab: usize,
    defined_names: Vec<DefinedName>,
}

struct DefinedName {
    name: String,
    sheet_index: Option<usize>,
    formula: String,
}

/// Loads the worksheet list, active tab and defined names
fn load_workbook(zip: &mut ZipArchive<UnifiedReader>) -> Result<WorkbookPart, SiteSheetError> {
    let relationships = load_relationships(zip, "xl/workbook.xml")?;
    let mut reader = zip.xml_reader("xl/workbook.xml")?
        .ok_or_else(|| SpreadsheetError::FileError("xl/workbook.xml".to_string()))?;
    let mut part = WorkbookPart {
        sheets: Vec::new(),
        active_tab: 0,
        defined_names: Vec::new(),
    };
    let mut defined_name = None::<DefinedName>;
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET => {
            let name = event.get_attribute_value("name")?;
            let id = event.get_local_attribute_value("id")?;
            if let Some((name, id)) = name.zip(id) {
                match relationships.get(&id.to_string()) {
                    Some(relationship) if relationship.is("worksheet") => {
                        part.sheets.push((name.to_string(), relationship.target.to_owned()));
                    }
                    _ => log::debug!("Skipping sheet '{name}' that is not a worksheet"),
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_WORKBOOK_VIEW => {
            part.active_tab = event.parse_attribute_value("activeTab")?.unwrap_or(0);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_DEFINED_NAME => {
            defined_name = Some(DefinedName {
                name: event.get_attribute_value("name")?.map(|name| name.to_string()).unwrap_or_default(),
                sheet_index: event.parse_attribute_value("localSheetId")?,
                formula: String::new(),
            });
        }
        Event::Text(event) if defined_name.is_some() => {
            if let Some(defined_name) = &mut defined_name {
                defined_name.formula.push_bytes_text(&event)?;
            }
        }
        Event::GeneralRef(event) if defined_name.is_some() => {
            if let Some(defined_name) = &mut defined_name {
                defined_name.formula.push_bytes_ref(&event)?;
            }
        }
        Event::End(event) if event.local_name().as_ref() == TAG_DEFINED_NAME => {
            part.defined_names.extend(defined_name.take());
        }
    });
    Ok(part)
}

/// Applies the print area and print titles stored as sheet-scoped defined names
fn apply_defined_name(sheet: &mut Worksheet, defined_name: &DefinedName) {
    let areas = defined_name.formula
        .split(',')
        .map(|area| area.rsplit_once('!').map(|(_, reference)| reference).unwrap_or(area).trim());
    match defined_name.name.as_str() {
        "_xlnm.Print_Area" => {
            if let Some(area) = areas.into_iter().find_map(|area| CellRange::from_str(area).ok()) {
                sheet.set_print_area(Some(area));
            }
        }
        "_xlnm.Print_Titles" => {
            for area in areas {
                if let Some(captures) = TITLE_ROWS_PATTERN.captures(area) {
                    let first = captures[1].parse::<u32>().ok();
                    let last = captures[2].parse::<u32>().ok();
                    sheet.set_print_title_rows(first.zip(last));
                }
            }
        }
        _ => (),
    }
}

/// Loads the shared string table
fn load_shared_strings(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<String>, SiteSheetError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_SHARED_STRING_ITEM => {
            let string = read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?;
            shared_strings.push(string);
        }
    });
    Ok(shared_strings)
}

/// The `styles.xml` collection currently being read
#[derive(Clone, Copy, PartialEq)]
enum StyleSection {
    None,
    NumberFormats,
    Fonts,
    Fills,
    Borders,
    CellFormats,
}

#[derive(Clone, Copy)]
enum BorderSide {
    Left,
    Right,
    Top,
    Bottom,
    Other,
}

/// Loads every cell format (`cellXfs`) as a fully resolved `CellStyle`
fn load_styles(zip: &mut ZipArchive<UnifiedReader>) -> Result<Vec<CellStyle>, SiteSheetError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut section = StyleSection::None;
    let mut number_formats = HashMap::<u32, String>::new();
    let mut fonts = Vec::<Font>::new();
    let mut fills = Vec::<Fill>::new();
    let mut borders = Vec::<Border>::new();
    let mut styles = Vec::<CellStyle>::new();

    let mut font = None::<Font>;
    let mut fill = None::<Fill>;
    let mut border = None::<Border>;
    let mut border_side = None::<BorderSide>;
    let mut style = None::<CellStyle>;

    match_xml_events!(reader => {
        Event::Start(event) if section == StyleSection::None => {
            section = match event.local_name().as_ref() {
                TAG_NUMBER_FORMATS => StyleSection::NumberFormats,
                TAG_FONTS => StyleSection::Fonts,
                TAG_FILLS => StyleSection::Fills,
                TAG_BORDERS => StyleSection::Borders,
                TAG_CELL_FORMATS => StyleSection::CellFormats,
                _ => StyleSection::None,
            };
        }
        Event::End(event) if section != StyleSection::None && matches!(
            event.local_name().as_ref(),
            TAG_NUMBER_FORMATS | TAG_FONTS | TAG_FILLS | TAG_BORDERS | TAG_CELL_FORMATS
        ) => {
            section = StyleSection::None;
        }

        Event::Start(event) if section == StyleSection::NumberFormats && event.local_name().as_ref() == TAG_NUMBER_FORMAT => {
            let id = event.parse_attribute_value::<u32>("numFmtId")?;
            let code = event.get_attribute_value("formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                number_formats.insert(id, code.to_string());
            }
        }

        Event::Start(event) if section == StyleSection::Fonts => {
            match event.local_name().as_ref() {
                TAG_FONT => font = Some(Font::default()),
                name => if let Some(font) = &mut font {
                    read_font_property(&event, name, font)?;
                },
            }
        }
        Event::End(event) if section == StyleSection::Fonts && event.local_name().as_ref() == TAG_FONT => {
            fonts.extend(font.take());
        }

        Event::Start(event) if section == StyleSection::Fills => {
            match event.local_name().as_ref() {
                TAG_FILL => fill = Some(Fill::default()),
                TAG_PATTERN_FILL => if let Some(fill) = &mut fill {
                    fill.pattern = event.get_attribute_value("patternType")?
                        .map(|name| FillPattern::parse(&name))
                        .unwrap_or_default();
                },
                b"fgColor" => if let Some(fill) = &mut fill {
                    fill.foreground = read_color(&event)?;
                },
                b"bgColor" => if let Some(fill) = &mut fill {
                    fill.background = read_color(&event)?;
                },
                _ => (),
            }
        }
        Event::End(event) if section == StyleSection::Fills && event.local_name().as_ref() == TAG_FILL => {
            fills.extend(fill.take());
        }

        Event::Start(event) if section == StyleSection::Borders => {
            let side = match event.local_name().as_ref() {
                TAG_BORDER => {
                    border = Some(Border::default());
                    None
                }
                b"left" | b"start" => Some(BorderSide::Left),
                b"right" | b"end" => Some(BorderSide::Right),
                b"top" => Some(BorderSide::Top),
                b"bottom" => Some(BorderSide::Bottom),
                TAG_COLOR => {
                    if let Some(edge) = border.as_mut().zip(border_side).and_then(|(border, side)| border_edge(border, side)) {
                        edge.color = read_color(&event)?;
                    }
                    None
                }
                _ => Some(BorderSide::Other),
            };
            if let Some(side) = side {
                border_side = Some(side);
                if let Some(edge) = border.as_mut().and_then(|border| border_edge(border, side)) {
                    edge.style = event.get_attribute_value("style")?
                        .map(|name| BorderStyle::parse(&name))
                        .unwrap_or_default();
                }
            }
        }
        Event::End(event) if section == StyleSection::Borders && event.local_name().as_ref() == TAG_BORDER => {
            borders.extend(border.take());
            border_side = None;
        }

        Event::Start(event) if section == StyleSection::CellFormats => {
            match event.local_name().as_ref() {
                TAG_CELL_FORMAT => {
                    let number_format = event.parse_attribute_value::<u32>("numFmtId")?.unwrap_or(0);
                    let font_id = event.parse_attribute_value::<usize>("fontId")?.unwrap_or(0);
                    let fill_id = event.parse_attribute_value::<usize>("fillId")?.unwrap_or(0);
                    let border_id = event.parse_attribute_value::<usize>("borderId")?.unwrap_or(0);
                    style = Some(CellStyle {
                        font: fonts.get(font_id).cloned().unwrap_or_default(),
                        fill: fills.get(fill_id).copied().unwrap_or_default(),
                        border: borders.get(border_id).copied().unwrap_or_default(),
                        alignment: Alignment::default(),
                        number_format: number_formats
                            .get(&number_format)
                            .map(String::to_owned)
                            .or_else(|| builtin_number_format(number_format).map(str::to_owned))
                            .unwrap_or_else(|| GENERAL_FORMAT.to_owned()),
                        protection: Protection::default(),
                    });
                }
                TAG_ALIGNMENT => if let Some(style) = &mut style {
                    style.alignment = read_alignment(&event)?;
                },
                TAG_PROTECTION => if let Some(style) = &mut style {
                    style.protection = Protection {
                        locked: event.get_flag("locked")?.unwrap_or(true),
                        hidden: event.get_flag("hidden")?.unwrap_or(false),
                    };
                },
                _ => (),
            }
        }
        Event::End(event) if section == StyleSection::CellFormats && event.local_name().as_ref() == TAG_CELL_FORMAT => {
            styles.extend(style.take());
        }
    });

    Ok(styles)
}

fn border_edge(border: &mut Border, side: BorderSide) -> Option<&mut BorderEdge> {
    match side {
        BorderSide::Left => Some(&mut border.left),
        BorderSide::Right => Some(&mut border.right),
        BorderSide::Top => Some(&mut border.top),
        BorderSide::Bottom => Some(&mut border.bottom),
        BorderSide::Other => None,
    }
}

/// Applies one child element of `<font>`
fn read_font_property(event: &BytesStart, name: &[u8], font: &mut Font) -> Result<(), SiteSheetError> {
    match name {
        b"b" => font.bold = event.get_flag("val")?.unwrap_or(true),
        b"i" => font.italic = event.get_flag("val")?.unwrap_or(true),
        b"strike" => font.strike = event.get_flag("val")?.unwrap_or(true),
        b"u" => font.underline = event.get_attribute_value("val")?.map(|value| value != "none").unwrap_or(true),
        b"sz" => font.size = event.parse_attribute_value("val")?,
        b"name" => font.name = event.get_attribute_value("val")?.map(|value| value.to_string()),
        TAG_COLOR => font.color = read_color(event)?,
        _ => (),
    }
    Ok(())
}

/// Reads a color element (`rgb`, `theme` with its `tint`, `indexed` or `auto`)
fn read_color(event: &BytesStart) -> Result<Option<Color>, SiteSheetError> {
    if let Some(rgb) = event.get_attribute_value("rgb")? {
        return Ok(Color::from_hex(&rgb));
    }
    if let Some(theme) = event.parse_attribute_value::<u8>("theme")? {
        let tint = event.parse_attribute_value::<f64>("tint")?.unwrap_or(0.0);
        return Ok(Some(Color::Theme(theme, tint)));
    }
    if let Some(index) = event.parse_attribute_value::<u8>("indexed")? {
        return Ok(Some(Color::Indexed(index)));
    }
    Ok(event.get_flag("auto")?.filter(|auto| *auto).map(|_| Color::Automatic))
}

fn read_alignment(event: &BytesStart) -> Result<Alignment, SiteSheetError> {
    Ok(Alignment {
        horizontal: event.get_attribute_value("horizontal")?
            .map(|name| HorizontalAlignment::parse(&name))
            .unwrap_or_default(),
        vertical: event.get_attribute_value("vertical")?
            .map(|name| VerticalAlignment::parse(&name))
            .unwrap_or_default(),
        wrap_text: event.get_flag("wrapText")?.unwrap_or(false),
        shrink_to_fit: event.get_flag("shrinkToFit")?.unwrap_or(false),
        indent: event.parse_attribute_value("indent")?.unwrap_or(0),
        rotation: event.parse_attribute_value("textRotation")?.unwrap_or(0),
    })
}

/// Type of the value held by a `<c>` element
#[derive(Clone, Copy, PartialEq)]
enum ValueType {
    Number,
    SharedString,
    InlineString,
    Boolean,
    Text,
}

/// Loads cells, dimensions, merges and page settings of one worksheet
///
/// # Returns
/// Relationship id of the worksheet's drawing part, if any
fn load_worksheet(
    zip: &mut ZipArchive<UnifiedReader>,
    path: &str,
    sheet: &mut Worksheet,
    shared_strings: &[String],
    styles: &[CellStyle],
) -> Result<Option<String>, SiteSheetError> {
    let mut reader = zip.xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::FileError(path.to_string()))?;
    read_worksheet(&mut reader, sheet, shared_strings, styles)
}

/// A formula shared down a block of cells, kept with the cell that spells it out
struct SharedFormula {
    text: String,
    row: u32,
    col: u16,
}

/// Style of a row or column, `None` when it carries no formatting
fn dimension_style(styles: &[CellStyle], index: Option<usize>) -> Option<CellStyle> {
    index
        .and_then(|index| styles.get(index))
        .filter(|style| !style.is_default())
        .cloned()
}

fn read_worksheet<R: BufRead>(
    reader: &mut XmlReader<R>,
    sheet: &mut Worksheet,
    shared_strings: &[String],
    styles: &[CellStyle],
) -> Result<Option<String>, SiteSheetError> {
    let mut drawing_id = None::<String>;
    let mut in_row_breaks = false;
    let mut row = 0u32;
    let mut col = 0u16;
    let mut value_type = ValueType::Number;
    let mut style_index = None::<usize>;
    let mut value = String::new();
    let mut formula = String::new();
    let mut shared_formulas = HashMap::<u32, SharedFormula>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_PAGE_SETUP_PROPERTIES => {
            sheet.page_setup.fit_to_page = event.get_flag("fitToPage")?.unwrap_or(false);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET_VIEW => {
            sheet.view.tab_selected = event.get_flag("tabSelected")?.unwrap_or(false);
            sheet.view.show_grid_lines = event.get_flag("showGridLines")?.unwrap_or(true);
            sheet.view.zoom = event.parse_attribute_value("zoomScale")?;
            sheet.view.mode = event.get_attribute_value("view")?
                .map(|name| SheetViewMode::parse(&name))
                .unwrap_or_default();
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_SHEET_FORMAT => {
            sheet.default_row_height = event.parse_attribute_value("defaultRowHeight")?;
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_COLUMN => {
            let min = event.parse_attribute_value::<u16>("min")?;
            let max = event.parse_attribute_value::<u16>("max")?;
            let width = event.parse_attribute_value::<f64>("width")?;
            let hidden = event.get_flag("hidden")?.unwrap_or(false);
            let style = dimension_style(styles, event.parse_attribute_value("style")?);
            if let (Some(min), Some(max)) = (min, max) {
                for index in min..=max.min(MAX_DIMENSIONED_COLUMN) {
                    if let Some(width) = width {
                        sheet.set_column_width(index, width);
                    }
                    sheet.set_column_hidden(index, hidden);
                    sheet.set_column_style(index, style.clone());
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_ROW => {
            row = event.parse_attribute_value("r")?.unwrap_or(row + 1);
            col = 0;
            if let Some(height) = event.parse_attribute_value::<f64>("ht")? {
                sheet.set_row_height(row, Some(height));
            }
            sheet.set_row_hidden(row, event.get_flag("hidden")?.unwrap_or(false));
            if event.get_flag("customFormat")?.unwrap_or(false) {
                sheet.set_row_style(row, dimension_style(styles, event.parse_attribute_value("s")?));
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| parse_reference(&reference))
                .unwrap_or((row, col + 1));
            value_type = match event.get_attribute_value("t")?.as_deref() {
                Some("s") => ValueType::SharedString,
                Some("inlineStr") => ValueType::InlineString,
                Some("b") => ValueType::Boolean,
                Some("str") | Some("e") | Some("d") => ValueType::Text,
                _ => ValueType::Number,
            };
            style_index = event.parse_attribute_value("s")?;
            value.clear();
            formula.clear();
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_FORMULA => {
            let shared_index = match event.get_attribute_value("t")?.as_deref() {
                Some("shared") => event.parse_attribute_value::<u32>("si")?,
                _ => None,
            };
            formula = read_string_value(reader, TAG_FORMULA, true)?;
            if let Some(index) = shared_index {
                if !formula.is_empty() {
                    shared_formulas.insert(index, SharedFormula { text: formula.clone(), row, col });
                } else if let Some(master) = shared_formulas.get(&index) {
                    formula = shift_formula(
                        &master.text,
                        row as i64 - master.row as i64,
                        col as i64 - master.col as i64,
                    );
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_INLINE_STRING => {
            value = read_string_value(reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_VALUE => {
            value = read_string_value(reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.local_name().as_ref() == TAG_CELL => {
            let cell = Cell {
                value: to_cell_value(value_type, &value, &formula, shared_strings)?,
                style: style_index
                    .and_then(|index| styles.get(index))
                    .cloned()
                    .unwrap_or_default(),
            };
            if !cell.is_blank() && row > 0 && col > 0 {
                sheet.cells.insert((row, col), cell);
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_MERGE_CELL => {
            if let Some(reference) = event.get_attribute_value("ref")? {
                let range = CellRange::from_str(&reference)?;
                if let Err(error) = sheet.merge(range) {
                    log::warn!("Ignoring merge region in worksheet '{}': {error}", sheet.name());
                }
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_PRINT_OPTIONS => {
            sheet.page_setup.center_horizontally = event.get_flag("horizontalCentered")?.unwrap_or(false);
            sheet.page_setup.center_vertically = event.get_flag("verticalCentered")?.unwrap_or(false);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_PAGE_MARGINS => {
            let margin = |name: &str| -> Result<f64, SiteSheetError> {
                Ok(event.parse_attribute_value(name)?.unwrap_or(0.0))
            };
            sheet.page_setup.margins = Some(Margins {
                left: margin("left")?,
                right: margin("right")?,
                top: margin("top")?,
                bottom: margin("bottom")?,
                header: margin("header")?,
                footer: margin("footer")?,
            });
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_PAGE_SETUP => {
            let setup = &mut sheet.page_setup;
            setup.paper_size = event.parse_attribute_value("paperSize")?;
            setup.scale = event.parse_attribute_value("scale")?;
            setup.fit_to_width = event.parse_attribute_value("fitToWidth")?;
            setup.fit_to_height = event.parse_attribute_value("fitToHeight")?;
            setup.orientation = match event.get_attribute_value("orientation")?.as_deref() {
                Some("portrait") => Some(Orientation::Portrait),
                Some("landscape") => Some(Orientation::Landscape),
                _ => None,
            };
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_ROW_BREAKS => in_row_breaks = true,
        Event::End(event) if event.local_name().as_ref() == TAG_ROW_BREAKS => in_row_breaks = false,
        Event::Start(event) if in_row_breaks && event.local_name().as_ref() == TAG_BREAK => {
            if let Some(id) = event.parse_attribute_value::<u32>("id")? {
                sheet.add_row_break(id);
            }
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_ODD_HEADER => {
            sheet.page_setup.header = Some(read_string_value(reader, TAG_ODD_HEADER, true)?);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_ODD_FOOTER => {
            sheet.page_setup.footer = Some(read_string_value(reader, TAG_ODD_FOOTER, true)?);
        }
        Event::Start(event) if event.local_name().as_ref() == TAG_DRAWING => {
            drawing_id = event.get_local_attribute_value("id")?.map(|id| id.to_string());
        }
    });

    Ok(drawing_id)
}

fn to_cell_value(value_type: ValueType, value: &str, formula: &str, shared_strings: &[String]) -> Result<CellValue, SiteSheetError> {
    if !formula.is_empty() {
        return Ok(CellValue::formula(formula));
    }
    let value = match value_type {
        _ if value.is_empty() && value_type != ValueType::SharedString => CellValue::Empty,
        ValueType::SharedString => {
            let index = value.parse::<usize>()?;
            let string = shared_strings
                .get(index)
                .ok_or(SpreadsheetError::SharedStringIndexError(index))?;
            CellValue::Text(string.to_owned())
        }
        ValueType::InlineString | ValueType::Text => CellValue::Text(value.to_owned()),
        ValueType::Boolean => CellValue::Boolean(value == "1" || value.eq_ignore_ascii_case("true")),
        ValueType::Number => CellValue::Number(value.parse::<f64>()?),
    };
    Ok(value)
}

/// A picture anchor collected from a drawing part before its media is loaded
#[derive(Default)]
struct PendingImage {
    anchor: TwoCellAnchor,
    extent: Option<(i64, i64)>,
    embed: Option<String>,
    description: Option<String>,
    one_cell: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum MarkerField {
    Col,
    ColOff,
    Row,
    RowOff,
}

/// Loads the pictures of a worksheet's drawing part
fn load_drawing(zip: &mut ZipArchive<UnifiedReader>, sheet_path: &str, drawing_id: &str, sheet: &mut Worksheet) -> Result<(), SiteSheetError> {
    let sheet_relationships = load_relationships(zip, sheet_path)?;
    let drawing_path = match sheet_relationships.get(drawing_id) {
        Some(relationship) if relationship.is("drawing") => relationship.target.to_owned(),
        _ => return Ok(()),
    };

    let mut pending = Vec::<PendingImage>::new();
    {
        let mut reader = match zip.xml_reader(&drawing_path)? {
            Some(reader) => reader,
            None => return Ok(()),
        };
        let mut image = None::<PendingImage>;
        let mut in_to = false;
        let mut field = None::<MarkerField>;
        let mut text = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if matches!(event.local_name().as_ref(), TAG_TWO_CELL_ANCHOR | TAG_ONE_CELL_ANCHOR) => {
                let one_cell = event.local_name().as_ref() == TAG_ONE_CELL_ANCHOR;
                let edit_as = event.get_attribute_value("editAs")?
                    .map(|name| EditAs::parse(&name))
                    .unwrap_or(if one_cell { EditAs::OneCell } else { EditAs::TwoCell });
                image = Some(PendingImage {
                    anchor: TwoCellAnchor { edit_as, ..TwoCellAnchor::default() },
                    one_cell,
                    ..PendingImage::default()
                });
            }
            Event::End(event) if matches!(event.local_name().as_ref(), TAG_TWO_CELL_ANCHOR | TAG_ONE_CELL_ANCHOR) => {
                pending.extend(image.take().filter(|image| image.embed.is_some()));
            }
            Event::Start(event) if image.is_some() => {
                let name = event.local_name();
                match name.as_ref() {
                    TAG_FROM => in_to = false,
                    TAG_TO => in_to = true,
                    b"col" => field = Some(MarkerField::Col),
                    b"colOff" => field = Some(MarkerField::ColOff),
                    b"row" => field = Some(MarkerField::Row),
                    b"rowOff" => field = Some(MarkerField::RowOff),
                    TAG_EXTENT => if let Some(image) = &mut image {
                        let cx = event.parse_attribute_value::<i64>("cx")?;
                        let cy = event.parse_attribute_value::<i64>("cy")?;
                        if let Some(extent) = cx.zip(cy) {
                            image.extent.get_or_insert(extent);
                        }
                    },
                    TAG_BLIP => if let Some(image) = &mut image {
                        image.embed = event.get_local_attribute_value("embed")?.map(|id| id.to_string());
                    },
                    TAG_NON_VISUAL_PROPERTIES => if let Some(image) = &mut image {
                        image.description = event.get_attribute_value("descr")?.map(|descr| descr.to_string());
                    },
                    _ => (),
                }
                text.clear();
            }
            Event::Text(event) if field.is_some() => text.push_bytes_text(&event)?,
            Event::End(_) if field.is_some() => {
                if let (Some(image), Some(current)) = (&mut image, field.take()) {
                    let marker = if in_to { &mut image.anchor.to } else { &mut image.anchor.from };
                    let number = text.trim().parse::<i64>()?;
                    match current {
                        MarkerField::Col => marker.col = number as u16,
                        MarkerField::ColOff => marker.col_off = number,
                        MarkerField::Row => marker.row = number as u32,
                        MarkerField::RowOff => marker.row_off = number,
                    }
                }
            }
        });
    }

    let drawing_relationships = load_relationships(zip, &drawing_path)?;
    for image in pending {
        let media_path = match image.embed.as_ref().and_then(|id| drawing_relationships.get(id)) {
            Some(relationship) if relationship.is("image") => relationship.target.to_owned(),
            _ => continue,
        };
        let data = match zip.read_bytes(&media_path)? {
            Some(data) => data,
            None => {
                log::warn!("Picture '{media_path}' referenced by '{}' is missing", split_part(&drawing_path).1);
                continue;
            }
        };

        let mut anchor = image.anchor;
        if image.one_cell {
            let (width, height) = image.extent.unwrap_or_default();
            anchor.to = AnchorMarker::new(anchor.from.col, anchor.from.col_off + width, anchor.from.row, anchor.from.row_off + height);
        }
        let (width, height) = image.extent.unwrap_or_else(|| anchor_extent(sheet, &anchor));
        sheet.add_image(SheetImage {
            data,
            anchor,
            width,
            height,
            description: image.description,
        });
    }
    Ok(())
}

/// Approximates the size of a two-cell anchor from the sheet's dimensions
fn anchor_extent(sheet: &Worksheet, anchor: &TwoCellAnchor) -> (i64, i64) {
    let column_emu = |col: u16| {
        let width = sheet.column_width(col + 1).unwrap_or(8.43);
        let pixels = if width < 1.0 { (width * 12.0).round() } else { (width * 7.0 + 5.0).round() };
        pixels as i64 * EMU_PER_PIXEL
    };
    let row_emu = |row: u32| {
        let height = sheet.row_height(row + 1).or(sheet.default_row_height).unwrap_or(15.0);
        (height * EMU_PER_POINT as f64).round() as i64
    };
    let width = (anchor.from.col..anchor.to.col).map(column_emu).sum::<i64>() - anchor.from.col_off + anchor.to.col_off;
    let height = (anchor.from.row..anchor.to.row).map(row_emu).sum::<i64>() - anchor.from.row_off + anchor.to.row_off;
    (width.max(0), height.max(0))
}

/// Reads string value from XML content, handling text and CDATA sections
///
/// Extracts string content from XML elements, skipping phonetic text annotations
/// and properly handling both text nodes and CDATA sections.
///
/// # Arguments
/// * `reader` - XML reader positioned at the start of the string content
/// * `end_tag` - XML tag that marks the end of the string content
/// * `is_text_content` - Whether to treat the content as text by default
///
/// # Returns
/// Extracted string value
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: &[u8],
    is_text_content: bool,
) -> Result<String, SiteSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.local_name().as_ref() == end_tag => break,
        Event::Start(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.local_name().as_ref() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.local_name().as_ref() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.local_name().as_ref() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_bytes_text(&event)?,
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
