use crate::config::EngineConfig;
use crate::config::MissingInputPolicy;
use crate::error::ResultMessage;
use crate::error::SiteSheetError;
use crate::images::ImageCache;
use crate::report::geometry::TemplateGeometry;
use crate::report::input::Payload;
use crate::report::input::ReportInput;
use crate::report::reference_sheet::fill_reference_sheet;
use crate::report::report_sheet::fill_report_sheet;
use crate::report::EngineError;
use crate::spreadsheet::page::Orientation;
use crate::spreadsheet::page::PAPER_A4;
use crate::spreadsheet::Workbook;
use crate::spreadsheet::Worksheet;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use std::str::FromStr;

/// Content type of the generated document
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Which sheets of the template end up in the output
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Daily report sheet only
    #[default]
    Report,
    /// Photo reference sheet only
    Reference,
    /// Both sheets, report sheet active
    Combined,
}

impl Mode {
    /// File name offered for download
    pub fn download_name(&self) -> &'static str {
        match self {
            Mode::Report => "Report_Only_Verification.xlsx",
            Mode::Reference => "Reference_Only_Verification.xlsx",
            Mode::Combined => "Full_Combined_Report.xlsx",
        }
    }

    fn fills_report(&self) -> bool {
        matches!(self, Mode::Report | Mode::Combined)
    }

    fn fills_reference(&self) -> bool {
        matches!(self, Mode::Reference | Mode::Combined)
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Report => "report",
            Mode::Reference => "reference",
            Mode::Combined => "combined",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Mode {
    type Err = EngineError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "report" => Ok(Mode::Report),
            "reference" => Ok(Mode::Reference),
            "combined" => Ok(Mode::Combined),
            _ => Err(EngineError::UnknownMode(value.to_owned())),
        }
    }
}

/// Print settings of a stand-alone reference sheet: one page wide, as many pages
/// down as the manual breaks produce, A4 portrait with the title rows repeated.
pub fn apply_reference_print_settings(sheet: &mut Worksheet, title_rows: (u32, u32)) {
    let setup = &mut sheet.page_setup;
    setup.fit_to_width = Some(1);
    setup.fit_to_height = Some(0);
    setup.fit_to_page = true;
    setup.orientation = Some(Orientation::Portrait);
    setup.paper_size = Some(PAPER_A4);
    setup.center_horizontally = true;
    sheet.set_print_title_rows(Some(title_rows));
}

/// Fills the site report template.
pub struct ReportEngine {
    config: EngineConfig,
    geometry: TemplateGeometry,
}

impl ReportEngine {
    pub fn new(config: EngineConfig) -> ReportEngine {
        ReportEngine {
            config,
            geometry: TemplateGeometry::default(),
        }
    }

    pub fn with_geometry(mut self, geometry: TemplateGeometry) -> ReportEngine {
        self.geometry = geometry;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reads the configured template from disk
    pub fn load_template(&self) -> Result<Workbook, SiteSheetError> {
        let path = &self.config.template_path;
        Workbook::open(path).with_prefix(&format!("Open template '{}'", path.display()))
    }

    /// Loads a fresh copy of the template, fills it and serializes the result
    pub fn generate(&self, payload: &Payload) -> Result<Vec<u8>, SiteSheetError> {
        let mut workbook = self.load_template()?;
        self.fill(&mut workbook, payload)?;
        workbook.save_to_buffer()
    }

    /// Same as [`ReportEngine::generate`] with the template already in memory
    pub fn generate_from_template(&self, template: &[u8], payload: &Payload) -> Result<Vec<u8>, SiteSheetError> {
        let mut workbook = Workbook::from_bytes(template.to_vec())?;
        self.fill(&mut workbook, payload)?;
        workbook.save_to_buffer()
    }

    /// Checks that the input carries what the mode needs
    fn validate(&self, mode: Mode, input: &ReportInput) -> Result<(), EngineError> {
        let missing = if mode == Mode::Reference {
            input.reference.is_none().then_some("reference")
        } else {
            input.project_name.is_none().then_some("projectName")
        };
        match (missing, self.config.missing_input) {
            (None, _) => Ok(()),
            (Some(field), MissingInputPolicy::Reject) => Err(EngineError::MissingInput(mode, field)),
            (Some(field), MissingInputPolicy::Proceed) => {
                log::warn!("Input for {mode} mode is missing '{field}', filling a best-effort document");
                Ok(())
            }
        }
    }

    /// Fills the sheets a mode asks for and removes the other one
    pub fn fill(&self, workbook: &mut Workbook, payload: &Payload) -> Result<(), SiteSheetError> {
        let (mode, input) = (payload.mode, &payload.data);
        self.validate(mode, input)?;

        let count = workbook.worksheets().len();
        let (report_index, reference_index) = (self.geometry.report_sheet, self.geometry.reference_sheet);
        if count < 2 || report_index >= count || reference_index >= count || report_index == reference_index {
            return Err(EngineError::TemplateLayout(count).into());
        }
        log::info!("Generating {mode} document");

        if mode.fills_report() {
            let sheet = workbook.worksheet_mut(report_index)?;
            fill_report_sheet(sheet, input, &self.geometry.report, &self.config)?;
        }

        if mode.fills_reference() {
            let title = input.table_title.as_deref().unwrap_or(&self.config.reference_title);
            let entries = input.reference.as_deref().unwrap_or_default();
            let sheet = workbook.worksheet_mut(reference_index)?;
            let mut cache = ImageCache::new();
            fill_reference_sheet(sheet, entries, title, &mut cache, &self.geometry.reference)?;
            apply_reference_print_settings(sheet, self.geometry.reference.title_rows);
        }

        // Index of the kept sheet once the other one is gone
        let shift = |kept: usize, removed: usize| if removed < kept { kept - 1 } else { kept };
        let shown = match mode {
            Mode::Report => {
                workbook.remove_worksheet(reference_index)?;
                shift(report_index, reference_index)
            }
            Mode::Reference => {
                workbook.remove_worksheet(report_index)?;
                shift(reference_index, report_index)
            }
            Mode::Combined => report_index,
        };
        workbook.set_active(shown)?;
        workbook.select_only(shown)?;
        Ok(())
    }
}

/// Generates the `.xlsx` bytes for one request from the template on disk
pub fn generate_report(config: &EngineConfig, payload: &Payload) -> Result<Vec<u8>, SiteSheetError> {
    ReportEngine::new(config.clone()).generate(payload)
}
