//! # Image Pipeline
//!
//! Turns the picture references of a photo entry into PNG bytes and anchors them
//! on a worksheet:
//!
//! - [`ImageSource`] resolves data URIs, file paths and open streams to raw bytes
//! - [`Rasterize`] / [`ImageRasterizer`] normalize any supported encoding to RGBA PNG
//! - [`ImageCache`] remembers both steps for the lifetime of one request
//! - [`placement`] computes the fixed-size two-cell anchor
mod cache;
pub mod placement;
mod raster;
mod source;

pub use cache::CacheSlot;
pub use cache::ImageCache;
pub use raster::is_svg;
pub use raster::ImageRasterizer;
pub use raster::Rasterize;
pub use source::ByteStream;
pub use source::ImageSource;
pub use source::SourceKey;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("SVG input requires the vector converter (build with the `svg_raster` feature)")]
    VectorConverterMissing,

    #[error("Render SVG failed: {0}")]
    VectorRenderError(String),

    #[error("Decode image failed: {0}")]
    DecodeError(String),

    #[error("Encode PNG failed: {0}")]
    EncodeError(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),

    #[error("Read image source '{0}' failed: {1}")]
    SourceError(String, String),
}

impl ImageError {
    /// Errors that abort the whole request instead of skipping one picture
    pub fn is_fatal(&self) -> bool {
        matches!(self, ImageError::VectorConverterMissing)
    }
}
