//! # Site Report Spreadsheet Generator
//!
//! Fills a fixed two-sheet `.xlsx` template with a construction site's daily report
//! and its photo reference pages, and returns the finished workbook as bytes.
//!
//! ## Features
//!
//! - **Template-preserving**: cell values and styles (theme tints included), merges,
//!   row and column formats, hidden rows and columns, pictures, headers, footers and
//!   print settings of the template survive the round trip through the in-memory
//!   document model. Conditional formats and data validation rules are not carried.
//! - **Growing tables**: team, material and machinery tables insert rows for long
//!   lists and every later section follows the explicit row offset
//! - **Photo pages**: four entries per printed page with section headings, manual
//!   page breaks and identically sized picture boxes
//! - **Any picture source**: data URIs, file paths or open byte streams in any common
//!   raster format, plus SVG, converted to PNG once per request
//!
//! ## Entry points
//!
//! - [`generate_report`]: loads the configured template and fills it for a [`Payload`]
//! - [`ReportEngine`]: the same with a custom geometry or an in-memory template
//! - [`report::report_sheet`] and [`report::reference_sheet`]: the individual fillers
pub mod config;
pub mod error;
pub mod images;
pub mod report;
pub mod spreadsheet;

mod helpers;

pub use config::EngineConfig;
pub use config::MissingInputPolicy;
pub use error::SiteSheetError;
pub use report::generate_report;
pub use report::Mode;
pub use report::Payload;
pub use report::ReportEngine;
pub use report::ReportInput;
pub use spreadsheet::Workbook;
