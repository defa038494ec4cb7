//! Fixed positions of the production template. All rows and columns are 1-based.

/// Column layout of one half of a two-sided table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableSide {
    pub description: u16,
    /// Unit column; team tables merge it into the description
    pub unit: u16,
    pub prev: u16,
    pub today: u16,
    /// Same-row sum of `prev` and `today`
    pub total: u16,
}

impl TableSide {
    pub const fn numeric_columns(&self) -> [u16; 3] {
        [self.prev, self.today, self.total]
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportGeometry {
    pub project_cell: (u32, u16),
    pub weather_cell: (u32, u16),
    pub temperature_cell: (u32, u16),
    pub date_cell: (u32, u16),
    pub date_format: &'static str,

    pub activity_row: u32,
    pub activity_columns: [u16; 2],

    /// First and last column of every table row
    pub first_col: u16,
    pub last_col: u16,
    pub left: TableSide,
    pub right: TableSide,
    pub count_format: &'static str,

    pub team_row: u32,
    pub team_template_rows: u32,
    /// Row whose height every team row takes
    pub team_height_row: u32,
    pub team_total_row: u32,

    pub supply_header_row: u32,
    pub supply_sub_header_row: u32,
    pub supply_row: u32,
    pub supply_template_rows: u32,
    pub supply_labels: [&'static str; 10],
    pub supply_header_height: f64,
    pub supply_row_height: f64,

    pub floor_row: u32,
    pub floor_height: f64,
    pub band_color: u32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceGeometry {
    pub title_cell: (u32, u16),
    pub heading_row: u32,
    pub entry_start: u32,
    pub entry_end: u32,
    /// Picture row relative to the first row of an entry block
    pub image_row_offset: u32,
    pub footer_row_offset: u32,
    pub image_columns: [u16; 2],
    pub footer_columns: [u16; 2],
    pub entries_per_page: u32,
    pub title_rows: (u32, u32),
}

impl ReferenceGeometry {
    pub fn entry_height(&self) -> u32 {
        self.entry_end - self.entry_start + 1
    }
}

/// Where every block of the two-sheet template lives
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateGeometry {
    pub report_sheet: usize,
    pub reference_sheet: usize,
    pub report: ReportGeometry,
    pub reference: ReferenceGeometry,
}

impl Default for ReportGeometry {
    fn default() -> Self {
        ReportGeometry {
            project_cell: (7, 2),
            weather_cell: (8, 2),
            temperature_cell: (9, 2),
            date_cell: (9, 9),
            date_format: "[$-F800]dddd, mmmm dd, yyyy",
            activity_row: 12,
            activity_columns: [2, 7],
            first_col: 2,
            last_col: 11,
            left: TableSide { description: 2, unit: 3, prev: 4, today: 5, total: 6 },
            right: TableSide { description: 7, unit: 8, prev: 9, today: 10, total: 11 },
            count_format: r#"#,##0;(#,##0);"-""#,
            team_row: 25,
            team_template_rows: 6,
            team_height_row: 15,
            team_total_row: 31,
            supply_header_row: 32,
            supply_sub_header_row: 33,
            supply_row: 34,
            supply_template_rows: 6,
            supply_labels: [
                "Description",
                "Unit",
                "Up to Previous",
                "Today",
                "Accumulated",
                "Description",
                "Unit",
                "Up to Previous",
                "Today",
                "Accumulated",
            ],
            supply_header_height: 20.0,
            supply_row_height: 18.0,
            floor_row: 75,
            floor_height: 15.0,
            band_color: 0x657C9C,
        }
    }
}

impl Default for ReferenceGeometry {
    fn default() -> Self {
        ReferenceGeometry {
            title_cell: (3, 2),
            heading_row: 5,
            entry_start: 6,
            entry_end: 9,
            image_row_offset: 1,
            footer_row_offset: 3,
            image_columns: [2, 4],
            footer_columns: [2, 4],
            entries_per_page: 4,
            title_rows: (1, 4),
        }
    }
}

impl Default for TemplateGeometry {
    fn default() -> Self {
        TemplateGeometry {
            report_sheet: 0,
            reference_sheet: 1,
            report: ReportGeometry::default(),
            reference: ReferenceGeometry::default(),
        }
    }
}
