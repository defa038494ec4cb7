//! The daily report sheet.
//!
//! Stages run top to bottom: header, activities, team tables, then the
//! materials and machinery tables. The team stage returns how many rows it
//! inserted; the supply stage adds that offset to every template row it touches
//! and returns the new cumulative offset.
use crate::config::EngineConfig;
use crate::helpers::string::wrap_lines;
use crate::report::geometry::ReportGeometry;
use crate::report::geometry::TableSide;
use crate::report::input::ReportInput;
use crate::report::input::SupplyItem;
use crate::report::input::TeamMember;
use crate::report::templates::copy_cell_style;
use crate::report::templates::copy_cell_style_keeping_format;
use crate::report::templates::merge_replacing;
use crate::report::templates::write_text;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::merge::CellRange;
use crate::spreadsheet::page::SheetViewMode;
use crate::spreadsheet::page::PAPER_A4;
use crate::spreadsheet::reference::column_name;
use crate::spreadsheet::style::Alignment;
use crate::spreadsheet::style::Color;
use crate::spreadsheet::style::Fill;
use crate::spreadsheet::style::Font;
use crate::spreadsheet::style::HorizontalAlignment;
use crate::spreadsheet::style::VerticalAlignment;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Worksheet;
use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

const TOTAL_LABEL: &str = "TOTAL";
const MATERIALS_TITLE: &str = "Materials Deliveries";
const MACHINERY_TITLE: &str = "Machinery & Equipment";

/// Layouts accepted for the report date once a trailing `Z` is dropped
const DATETIME_FORMATS: [&str; 4] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"];

/// Parses an ISO date or date-time; a UTC `Z` suffix and offsets are accepted
pub fn parse_report_date(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim().replace('Z', "");
    if let Ok(date) = NaiveDate::parse_from_str(&text, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0);
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&text, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(&text).ok().map(|datetime| datetime.naive_local()))
}

/// Writes project name, weather, temperatures and the report date
pub fn fill_header(sheet: &mut Worksheet, input: &ReportInput, geometry: &ReportGeometry) {
    let (row, col) = geometry.project_cell;
    let project = input.project_name.as_deref().unwrap_or_default();
    sheet.set_value(row, col, format!("Project Name : {project}"));

    let (row, col) = geometry.weather_cell;
    sheet.set_value(
        row,
        col,
        format!("Weather          : AM {}  |  PM {}", input.weather_am, input.weather_pm),
    );

    let celsius = |value: &str| if value.is_empty() { String::new() } else { format!("{value}°C") };
    let (row, col) = geometry.temperature_cell;
    sheet.set_value(
        row,
        col,
        format!("Temperature  : AM {}    |  PM {}", celsius(&input.temp_am), celsius(&input.temp_pm)),
    );

    if input.report_date.is_empty() {
        return;
    }
    let (row, col) = geometry.date_cell;
    match parse_report_date(&input.report_date) {
        Some(date) => {
            sheet.set_value(row, col, date);
            let style = sheet.style_mut(row, col);
            style.number_format = geometry.date_format.to_owned();
            style.alignment = Alignment::new(HorizontalAlignment::Right, VerticalAlignment::Center);
        }
        None => {
            log::warn!("Report date '{}' is not an ISO date, written as text", input.report_date);
            sheet.set_value(row, col, input.report_date.as_str());
        }
    }
}

/// Wraps the two narrative fields into their fixed rows. Lines past
/// `config.activity_rows` are dropped.
pub fn fill_activities(sheet: &mut Worksheet, input: &ReportInput, geometry: &ReportGeometry, config: &EngineConfig) {
    let texts = [&input.activity_today, &input.work_plan_next_day];
    for (col, text) in geometry.activity_columns.into_iter().zip(texts) {
        let lines = wrap_lines(text, config.wrap_width);
        if lines.len() > config.activity_rows as usize {
            log::debug!("Activity column {} truncated from {} to {} lines", column_name(col), lines.len(), config.activity_rows);
        }
        for (row, line) in (geometry.activity_row..).zip(lines.iter().take(config.activity_rows as usize)) {
            write_text(sheet, row, col, line);
        }

        for row in geometry.activity_row..geometry.activity_row + config.activity_rows {
            let style = sheet.style_mut(row, col);
            style.alignment = Alignment::new(HorizontalAlignment::Left, VerticalAlignment::Top).with_wrap_text();
            style.font = Font::new("Arial", 10.0);
        }
    }
}

/// Rows beyond the template block that a table needs for `lengths` entries
pub fn table_growth(template_rows: u32, lengths: [usize; 2]) -> u32 {
    let longest = lengths.into_iter().max().unwrap_or(0) as u32;
    longest.saturating_sub(template_rows)
}

/// Row of the colored bar closing the report once both table stages have grown
pub fn dynamic_floor_row(geometry: &ReportGeometry, shift: u32, supply_lengths: [usize; 2]) -> u32 {
    geometry.floor_row + shift + table_growth(geometry.supply_template_rows, supply_lengths)
}

fn sum_of(col: u16, row: u32) -> String {
    let name = column_name(col);
    format!("{name}{row}")
}

fn row_formula(side: &TableSide, row: u32) -> CellValue {
    CellValue::formula(format!("{}+{}", sum_of(side.prev, row), sum_of(side.today, row)))
}

fn apply_count_format(sheet: &mut Worksheet, row: u32, col: u16, geometry: &ReportGeometry) {
    let style = sheet.style_mut(row, col);
    style.number_format = geometry.count_format.to_owned();
    style.alignment = Alignment::centered();
}

fn write_team_side(sheet: &mut Worksheet, row: u32, side: &TableSide, member: &TeamMember) {
    write_text(sheet, row, side.description, &member.description);
    sheet.set_value(row, side.prev, member.prev);
    sheet.set_value(row, side.today, member.today);
    sheet.set_value(row, side.total, row_formula(side, row));
}

/// Fills the management and working team tables.
///
/// Both tables share rows, so `max(template rows, management, working)` rows are
/// laid out; the extra rows are inserted in front of the template total row.
///
/// # Returns
/// The number of rows inserted, which every later section adds to its rows
pub fn fill_team_tables(sheet: &mut Worksheet, input: &ReportInput, geometry: &ReportGeometry) -> Result<u32, SpreadsheetError> {
    let (left, right) = (&input.management_team, &input.working_team);
    let start = geometry.team_row;
    let shift = table_growth(geometry.team_template_rows, [left.len(), right.len()]);
    let needed = geometry.team_template_rows + shift;
    if shift > 0 {
        log::debug!("Team tables need {needed} rows, inserting {shift} at row {}", start + geometry.team_template_rows);
        sheet.insert_rows(start + geometry.team_template_rows, shift);
    }

    let height = sheet.row_height(geometry.team_height_row);
    let sides = [(&geometry.left, left), (&geometry.right, right)];
    let empty = TeamMember::default();

    // Every row takes the look of the first template row before any count format lands on it.
    for row in start + 1..start + needed {
        for col in geometry.first_col..=geometry.last_col {
            copy_cell_style_keeping_format(sheet, (start, col), (row, col));
        }
    }

    for (index, row) in (start..start + needed).enumerate() {
        sheet.set_row_height(row, height);
        sheet.unmerge_overlapping(&CellRange::row_span(row, geometry.first_col, geometry.last_col));
        for (side, _) in sides {
            sheet.merge(CellRange::row_span(row, side.description, side.unit))?;
        }

        for (side, members) in sides {
            write_team_side(sheet, row, side, members.get(index).unwrap_or(&empty));
            for col in side.numeric_columns() {
                apply_count_format(sheet, row, col, geometry);
            }
        }
    }

    // The template total row has moved down by `shift` and now sits right below the data.
    let total = start + needed;
    for (side, _) in sides {
        merge_replacing(sheet, CellRange::row_span(total, side.description, side.unit))?;
        sheet.set_value(total, side.description, TOTAL_LABEL);
        for col in side.numeric_columns() {
            let name = column_name(col);
            sheet.set_value(total, col, CellValue::formula(format!("SUM({name}{start}:{name}{})", total - 1)));
            apply_count_format(sheet, total, col, geometry);
        }
    }
    for col in geometry.first_col..=geometry.last_col {
        sheet.style_mut(total, col).font.bold = true;
    }

    Ok(shift)
}

fn write_supply_side(sheet: &mut Worksheet, row: u32, side: &TableSide, item: &SupplyItem, geometry: &ReportGeometry) {
    if item.description.is_empty() {
        return;
    }
    write_text(sheet, row, side.description, &item.description);
    write_text(sheet, row, side.unit, &item.unit);
    sheet.set_value(row, side.prev, item.prev);
    sheet.set_value(row, side.today, item.today);
    sheet.set_value(row, side.total, row_formula(side, row));

    sheet.style_mut(row, side.unit).alignment = Alignment::centered();
    for col in side.numeric_columns() {
        apply_count_format(sheet, row, col, geometry);
    }
}

/// Fills the materials and machinery tables, `shift` rows below their template position.
///
/// # Returns
/// `shift` plus the rows this stage inserted
pub fn fill_material_machinery_tables(
    sheet: &mut Worksheet,
    input: &ReportInput,
    geometry: &ReportGeometry,
    shift: u32,
) -> Result<u32, SpreadsheetError> {
    let (materials, machinery) = (&input.materials, &input.machinery);
    let header_row = geometry.supply_header_row + shift;
    let sub_header_row = geometry.supply_sub_header_row + shift;
    let data_start = geometry.supply_row + shift;

    let growth = table_growth(geometry.supply_template_rows, [materials.len(), machinery.len()]);
    let needed = geometry.supply_template_rows + growth;
    if growth > 0 {
        log::debug!("Supply tables need {needed} rows, inserting {growth} at row {}", data_start + geometry.supply_template_rows);
        sheet.insert_rows(data_start + geometry.supply_template_rows, growth);
    }

    // Group header: two merged bands
    sheet.set_row_height(header_row, Some(geometry.supply_header_height));
    for row in [header_row, sub_header_row] {
        sheet.unmerge_overlapping(&CellRange::row_span(row, geometry.first_col, geometry.last_col));
    }
    let band = Color::Rgb(geometry.band_color);
    for (side, title) in [(&geometry.left, MATERIALS_TITLE), (&geometry.right, MACHINERY_TITLE)] {
        sheet.merge(CellRange::row_span(header_row, side.description, side.total))?;
        sheet.set_value(header_row, side.description, title);
    }
    for col in geometry.first_col..=geometry.last_col {
        let style = sheet.style_mut(header_row, col);
        style.fill = Fill::solid(band);
        style.font = Font::new("Arial", 11.0).with_bold(true).with_color(Color::Rgb(0xFFFFFF));
        style.alignment = Alignment::centered();
    }

    // Column labels
    for (col, label) in (geometry.first_col..=geometry.last_col).zip(geometry.supply_labels) {
        sheet.set_value(sub_header_row, col, label);
        let style = sheet.style_mut(sub_header_row, col);
        style.font = Font {
            name: style.font.name.take(),
            size: Some(10.0),
            color: Some(Color::Rgb(0x000000)),
            ..Font::default()
        };
        style.alignment = Alignment::centered();
    }

    for row in data_start + 1..data_start + needed {
        for col in geometry.first_col..=geometry.last_col {
            copy_cell_style(sheet, (data_start, col), (row, col));
        }
    }

    let empty = SupplyItem::default();
    for (index, row) in (data_start..data_start + needed).enumerate() {
        sheet.set_row_height(row, Some(geometry.supply_row_height));
        write_supply_side(sheet, row, &geometry.left, materials.get(index).unwrap_or(&empty), geometry);
        write_supply_side(sheet, row, &geometry.right, machinery.get(index).unwrap_or(&empty), geometry);
    }

    let floor = dynamic_floor_row(geometry, shift, [materials.len(), machinery.len()]);
    log::debug!("Dynamic floor at row {floor}");
    for col in geometry.first_col..=geometry.last_col {
        sheet.style_mut(floor, col).fill = Fill::solid(band);
    }
    sheet.set_row_height(floor, Some(geometry.floor_height));

    sheet.view.mode = SheetViewMode::PageBreakPreview;
    sheet.set_print_area(Some(CellRange::new(1, geometry.first_col, floor, geometry.last_col)));
    let setup = &mut sheet.page_setup;
    setup.fit_to_width = Some(1);
    setup.fit_to_height = Some(1);
    setup.fit_to_page = true;
    setup.center_horizontally = true;
    setup.center_vertically = false;
    setup.paper_size = Some(PAPER_A4);

    Ok(shift + growth)
}

/// Runs every report stage in order.
///
/// # Returns
/// The cumulative number of rows inserted
pub fn fill_report_sheet(
    sheet: &mut Worksheet,
    input: &ReportInput,
    geometry: &ReportGeometry,
    config: &EngineConfig,
) -> Result<u32, SpreadsheetError> {
    fill_header(sheet, input, geometry);
    fill_activities(sheet, input, geometry, config);
    let shift = fill_team_tables(sheet, input, geometry)?;
    let offset = fill_material_machinery_tables(sheet, input, geometry, shift)?;
    log::info!(
        "Filled report sheet '{}': {} management, {} working, {} materials, {} machinery, {offset} rows inserted",
        sheet.name(),
        input.management_team.len(),
        input.working_team.len(),
        input.materials.len(),
        input.machinery.len(),
    );
    Ok(offset)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::spreadsheet::style::BorderStyle;
    use crate::spreadsheet::style::FillPattern;
    use crate::spreadsheet::style::GENERAL_FORMAT;

    fn range(text: &str) -> CellRange {
        text.parse().unwrap()
    }

    /// The report sheet of the production template, reduced to what the fillers read
    pub(crate) fn report_template() -> Worksheet {
        let mut sheet = Worksheet::new("Daily Report");
        sheet.merge(range("B7:H7")).unwrap();
        sheet.merge(range("B8:H8")).unwrap();
        sheet.merge(range("B9:H9")).unwrap();
        sheet.set_row_height(15, Some(16.5));
        for row in 25..=30 {
            sheet.merge(CellRange::row_span(row, 2, 3)).unwrap();
            sheet.merge(CellRange::row_span(row, 7, 8)).unwrap();
            for col in 2..=11 {
                sheet.style_mut(row, col).border.bottom.style = BorderStyle::Thin;
            }
        }
        sheet.style_mut(25, 2).font = Font::new("Arial", 10.0);
        sheet.merge(range("B31:C31")).unwrap();
        sheet.merge(range("G31:H31")).unwrap();
        sheet.set_value(31, 2, "TOTAL");
        sheet.style_mut(31, 2).fill = Fill::solid(Color::Rgb(0xD9D9D9));
        sheet.merge(range("B32:F32")).unwrap();
        sheet.merge(range("G32:K32")).unwrap();
        sheet.set_value(32, 2, "Materials");
        sheet.style_mut(33, 4).font = Font::new("Calibri", 9.0).with_bold(true);
        for row in 34..=39 {
            for col in 2..=11 {
                sheet.style_mut(row, col).border.left.style = BorderStyle::Thin;
            }
        }
        sheet.set_value(60, 2, "Prepared by");
        sheet.style_mut(75, 2).fill = Fill::solid(Color::Rgb(0x657C9C));
        sheet.set_print_area(Some(range("B1:K75")));
        sheet
    }

    fn members(count: usize) -> Vec<TeamMember> {
        (0..count)
            .map(|index| TeamMember {
                description: format!("Role {index}"),
                prev: index as f64,
                today: 1.0,
            })
            .collect()
    }

    fn items(count: usize) -> Vec<SupplyItem> {
        (0..count)
            .map(|index| SupplyItem {
                description: format!("Item {index}"),
                unit: "pcs".to_owned(),
                prev: 2.0,
                today: index as f64,
            })
            .collect()
    }

    #[test]
    fn parses_iso_dates_only() {
        let expected = NaiveDate::from_ymd_opt(2026, 9, 25).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_report_date("2026-09-25"), Some(expected));
        assert_eq!(parse_report_date("2026-09-25T00:00:00.000Z"), Some(expected));
        assert_eq!(parse_report_date("2026-09-25 00:00"), Some(expected));
        assert_eq!(parse_report_date("2026-09-25T00:00:00+07:00"), Some(expected));
        assert_eq!(parse_report_date("25/09/2026"), None);
        assert_eq!(parse_report_date("tomorrow"), None);
    }

    #[test]
    fn writes_header_strings_and_date() {
        let mut sheet = report_template();
        let input = ReportInput {
            project_name: Some("Tower B".to_owned()),
            weather_am: "Sunny".to_owned(),
            weather_pm: "Rain".to_owned(),
            temp_am: "0".to_owned(),
            report_date: "2026-09-25".to_owned(),
            ..ReportInput::default()
        };
        let geometry = ReportGeometry::default();
        fill_header(&mut sheet, &input, &geometry);
        assert_eq!(sheet.value(7, 2), &CellValue::from("Project Name : Tower B"));
        assert_eq!(sheet.value(8, 5), &CellValue::from("Weather          : AM Sunny  |  PM Rain"));
        assert_eq!(sheet.value(9, 2), &CellValue::from("Temperature  : AM 0°C    |  PM "));
        assert!(matches!(sheet.value(9, 9), CellValue::DateTime(_)));
        let style = sheet.style(9, 9).unwrap();
        assert_eq!(style.number_format, "[$-F800]dddd, mmmm dd, yyyy");
        assert_eq!(style.alignment.horizontal, HorizontalAlignment::Right);
    }

    #[test]
    fn numeric_zero_temperatures_print_blank() {
        let mut sheet = report_template();
        let input: ReportInput = serde_json::from_str(r#"{"tempAM": 0, "tempPM": 31}"#).unwrap();
        fill_header(&mut sheet, &input, &ReportGeometry::default());
        assert_eq!(sheet.value(9, 2), &CellValue::from("Temperature  : AM     |  PM 31°C"));
    }

    #[test]
    fn malformed_dates_are_written_as_text() {
        let mut sheet = report_template();
        let input = ReportInput {
            report_date: "25/09/2026".to_owned(),
            ..ReportInput::default()
        };
        fill_header(&mut sheet, &input, &ReportGeometry::default());
        assert_eq!(sheet.value(9, 9), &CellValue::from("25/09/2026"));
        assert_eq!(sheet.value(7, 2), &CellValue::from("Project Name : "));
    }

    #[test]
    fn wraps_activities_into_ten_rows() {
        let mut sheet = report_template();
        let input = ReportInput {
            activity_today: "Formwork level 3\n\nRebar inspection".to_owned(),
            work_plan_next_day: (1..=14).map(|n| format!("step {n}")).collect::<Vec<_>>().join("\n"),
            ..ReportInput::default()
        };
        fill_activities(&mut sheet, &input, &ReportGeometry::default(), &EngineConfig::default());
        assert_eq!(sheet.value(12, 2), &CellValue::from("Formwork level 3"));
        assert_eq!(sheet.value(13, 2), &CellValue::Empty);
        assert_eq!(sheet.value(14, 2), &CellValue::from("Rebar inspection"));
        assert_eq!(sheet.value(21, 7), &CellValue::from("step 10"));
        assert_eq!(sheet.value(22, 7), &CellValue::Empty);
        let style = sheet.style(20, 2).unwrap();
        assert!(style.alignment.wrap_text);
        assert_eq!(style.font, Font::new("Arial", 10.0));
    }

    #[test]
    fn short_team_lists_insert_nothing() {
        for (m, n) in [(0, 0), (3, 6), (6, 2)] {
            let mut sheet = report_template();
            let input = ReportInput {
                management_team: members(m),
                working_team: members(n),
                ..ReportInput::default()
            };
            let shift = fill_team_tables(&mut sheet, &input, &ReportGeometry::default()).unwrap();
            assert_eq!(shift, 0);
            assert_eq!(sheet.value(31, 2), &CellValue::from("TOTAL"));
            assert_eq!(sheet.value(32, 2), &CellValue::from("Materials"));
            assert_eq!(sheet.value(60, 2), &CellValue::from("Prepared by"));
        }
    }

    #[test]
    fn long_team_lists_shift_everything_below() {
        let mut sheet = report_template();
        let input = ReportInput {
            management_team: members(9),
            working_team: members(4),
            ..ReportInput::default()
        };
        let shift = fill_team_tables(&mut sheet, &input, &ReportGeometry::default()).unwrap();
        assert_eq!(shift, 3);

        assert_eq!(sheet.value(33, 2), &CellValue::from("Role 8"));
        assert_eq!(sheet.value(33, 4), &CellValue::Number(8.0));
        assert_eq!(sheet.value(33, 6), &CellValue::formula("D33+E33"));
        assert_eq!(sheet.value(33, 7), &CellValue::Empty);
        assert_eq!(sheet.value(33, 9), &CellValue::Number(0.0));
        assert_eq!(sheet.value(33, 11), &CellValue::formula("I33+J33"));
        assert!(sheet.merges().contains(&range("B33:C33")));
        assert!(sheet.merges().contains(&range("G33:H33")));
        assert_eq!(sheet.row_height(33), Some(16.5));
        assert_eq!(sheet.style(33, 2).unwrap().font, Font::new("Arial", 10.0));
        assert_eq!(sheet.style(33, 4).unwrap().number_format, r#"#,##0;(#,##0);"-""#);

        assert_eq!(sheet.value(34, 2), &CellValue::from("TOTAL"));
        assert_eq!(sheet.value(34, 7), &CellValue::from("TOTAL"));
        assert_eq!(sheet.value(34, 4), &CellValue::formula("SUM(D25:D33)"));
        assert_eq!(sheet.value(34, 11), &CellValue::formula("SUM(K25:K33)"));
        let total = sheet.style(34, 5).unwrap();
        assert!(total.font.bold);
        assert_eq!(total.number_format, r#"#,##0;(#,##0);"-""#);
        assert_eq!(sheet.style(34, 2).unwrap().fill, Fill::solid(Color::Rgb(0xD9D9D9)));

        assert_eq!(sheet.value(35, 2), &CellValue::from("Materials"));
        assert_eq!(sheet.value(63, 2), &CellValue::from("Prepared by"));
        assert_eq!(sheet.print_area(), Some(range("B1:K78")));
    }

    #[test]
    fn added_rows_take_the_first_template_row_style() {
        let mut sheet = report_template();
        sheet.style_mut(25, 5).fill = Fill::solid(Color::Rgb(0xFFF2CC));
        sheet.style_mut(25, 2).number_format = "@".to_owned();
        sheet.style_mut(34, 8).fill = Fill::solid(Color::Rgb(0xE2EFDA));
        sheet.style_mut(34, 8).number_format = "@".to_owned();
        let input = ReportInput {
            management_team: members(8),
            materials: items(7),
            ..ReportInput::default()
        };
        let geometry = ReportGeometry::default();
        let offset = fill_report_sheet(&mut sheet, &input, &geometry, &EngineConfig::default()).unwrap();
        assert_eq!(offset, 3);

        let team = sheet.style(32, 5).unwrap();
        assert_eq!(team.fill, Fill::solid(Color::Rgb(0xFFF2CC)));
        assert_eq!(team.number_format, geometry.count_format);
        assert_eq!(sheet.style(32, 2).unwrap().number_format, GENERAL_FORMAT);
        assert_eq!(sheet.style(32, 2).unwrap().font, Font::new("Arial", 10.0));

        let supply = sheet.style(42, 8).unwrap();
        assert_eq!(supply.fill, Fill::solid(Color::Rgb(0xE2EFDA)));
        assert_eq!(supply.number_format, "@");
        assert_eq!(sheet.style(42, 2).unwrap().border.left.style, BorderStyle::Thin);
    }

    #[test]
    fn floor_row_follows_both_table_stages() {
        let geometry = ReportGeometry::default();
        assert_eq!(dynamic_floor_row(&geometry, 0, [0, 0]), 75);
        assert_eq!(dynamic_floor_row(&geometry, 0, [6, 3]), 75);
        assert_eq!(dynamic_floor_row(&geometry, 2, [4, 9]), 80);
        assert_eq!(dynamic_floor_row(&geometry, 3, [8, 1]), 80);
    }

    #[test]
    fn supply_tables_grow_below_the_team_offset() {
        let mut sheet = report_template();
        let input = ReportInput {
            management_team: members(9),
            materials: items(8),
            machinery: items(2),
            ..ReportInput::default()
        };
        let geometry = ReportGeometry::default();
        let offset = fill_report_sheet(&mut sheet, &input, &geometry, &EngineConfig::default()).unwrap();
        assert_eq!(offset, 5);

        assert!(sheet.merges().contains(&range("B35:F35")));
        assert!(sheet.merges().contains(&range("G35:K35")));
        assert_eq!(sheet.value(35, 2), &CellValue::from("Materials Deliveries"));
        assert_eq!(sheet.value(35, 7), &CellValue::from("Machinery & Equipment"));
        assert_eq!(sheet.row_height(35), Some(20.0));
        let header = sheet.style(35, 9).unwrap();
        assert_eq!(header.fill, Fill::solid(Color::Rgb(0x657C9C)));
        assert!(header.font.bold);

        assert_eq!(sheet.value(36, 4), &CellValue::from("Up to Previous"));
        assert_eq!(sheet.style(36, 4).unwrap().font, Font {
            name: Some("Calibri".to_owned()),
            size: Some(10.0),
            color: Some(Color::Rgb(0)),
            ..Font::default()
        });

        assert_eq!(sheet.value(44, 2), &CellValue::from("Item 7"));
        assert_eq!(sheet.value(44, 6), &CellValue::formula("D44+E44"));
        assert_eq!(sheet.value(44, 7), &CellValue::Empty);
        assert_eq!(sheet.style(44, 3).unwrap().border.left.style, BorderStyle::Thin);
        assert_eq!(sheet.row_height(44), Some(18.0));

        let floor = dynamic_floor_row(&geometry, 3, [8, 2]);
        assert_eq!(floor, 80);
        assert_eq!(sheet.style(floor, 11).unwrap().fill.pattern, FillPattern::Solid);
        assert_eq!(sheet.row_height(floor), Some(15.0));
        assert_eq!(sheet.value(65, 2), &CellValue::from("Prepared by"));
        assert_eq!(sheet.print_area(), Some(range("B1:K80")));
        assert_eq!(sheet.view.mode, SheetViewMode::PageBreakPreview);
        assert!(sheet.page_setup.fit_to_page);
        assert_eq!(sheet.page_setup.paper_size, Some(PAPER_A4));
    }

    #[test]
    fn material_and_machinery_sides_are_independent() {
        let mut sheet = report_template();
        let input = ReportInput {
            materials: vec![SupplyItem::default()],
            machinery: vec![SupplyItem {
                description: "Tower crane".to_owned(),
                unit: "unit".to_owned(),
                prev: 1.0,
                today: 1.0,
            }],
            ..ReportInput::default()
        };
        let offset = fill_material_machinery_tables(&mut sheet, &input, &ReportGeometry::default(), 0).unwrap();
        assert_eq!(offset, 0);
        for col in 2..=6 {
            assert_eq!(sheet.value(34, col), &CellValue::Empty);
        }
        assert_eq!(sheet.value(34, 7), &CellValue::from("Tower crane"));
        assert_eq!(sheet.value(34, 8), &CellValue::from("unit"));
        assert_eq!(sheet.value(34, 9), &CellValue::Number(1.0));
        assert_eq!(sheet.value(34, 11), &CellValue::formula("I34+J34"));
        assert_eq!(sheet.value(35, 9), &CellValue::Empty);
    }
}
