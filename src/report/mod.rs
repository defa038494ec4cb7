//! # Template Filling Engine
//!
//! Fills the two worksheets of the site report template:
//!
//! - [`report_sheet`]: header fields, activity text and the four growing tables
//!   of the daily report. Each stage that inserts rows returns the number of rows
//!   it added, and the next stage receives it as an explicit offset.
//! - [`reference_sheet`]: photo entries laid out four per printed page.
//! - [`engine`]: loads the template, runs the fillers for a [`Mode`] and keeps
//!   only the requested sheets.
pub mod engine;
pub mod geometry;
pub mod input;
pub mod reference_sheet;
pub mod report_sheet;
pub mod templates;

pub use engine::generate_report;
pub use engine::Mode;
pub use engine::ReportEngine;
pub use geometry::TemplateGeometry;
pub use input::Payload;
pub use input::ReportInput;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Input for {0} mode is missing '{1}'")]
    MissingInput(Mode, &'static str),

    #[error("Unknown mode '{0}', expected report, reference or combined")]
    UnknownMode(String),

    #[error("Template must contain a report and a reference sheet, found {0} worksheet(s)")]
    TemplateLayout(usize),
}
