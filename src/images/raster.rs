use crate::images::ImageError;
use image::DynamicImage;
use image::ImageFormat;
use image::ImageReader;
use image::RgbaImage;
use std::io::Cursor;

/// Number of leading bytes searched for an `<svg` marker
const SVG_SNIFF_LEN: usize = 200;

/// Formats without a reliable signature, tried when sniffing fails
const FALLBACK_FORMATS: [ImageFormat; 2] = [ImageFormat::Tga, ImageFormat::Ico];

/// Converts encoded picture bytes into RGBA PNG bytes
pub trait Rasterize {
    /// # Arguments
    /// * `bytes` - Encoded picture
    /// * `name_hint` - Optional file name; a `.svg` extension selects the vector path
    fn rasterize(&self, bytes: &[u8], name_hint: Option<&str>) -> Result<Vec<u8>, ImageError>;
}

/// The production rasterizer: `resvg` for SVG, the `image` crate for everything else.
#[derive(Clone, Copy, Debug, Default)]
pub struct ImageRasterizer;

impl Rasterize for ImageRasterizer {
    fn rasterize(&self, bytes: &[u8], name_hint: Option<&str>) -> Result<Vec<u8>, ImageError> {
        if is_svg(bytes, name_hint) {
            return render_svg(bytes);
        }

        let decoded = match decode(bytes) {
            Ok(image) => image,
            Err(error) => decode_fallback(bytes).ok_or(error)?,
        };
        encode_png(decoded.to_rgba8())
    }
}

/// True when the name ends in `.svg` or an `<svg` tag appears near the start
pub fn is_svg(bytes: &[u8], name_hint: Option<&str>) -> bool {
    if name_hint.is_some_and(|name| name.to_ascii_lowercase().ends_with(".svg")) {
        return true;
    }
    let prefix = bytes[..bytes.len().min(SVG_SNIFF_LEN)].to_ascii_lowercase();
    prefix.windows(4).any(|window| window == b"<svg")
}

/// Decodes by content sniffing; animated formats yield their first frame
fn decode(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|error| ImageError::DecodeError(error.to_string()))?
        .decode()
        .map_err(|error| ImageError::DecodeError(error.to_string()))
}

fn decode_fallback(bytes: &[u8]) -> Option<DynamicImage> {
    FALLBACK_FORMATS
        .iter()
        .find_map(|format| image::load_from_memory_with_format(bytes, *format).ok())
}

fn encode_png(image: RgbaImage) -> Result<Vec<u8>, ImageError> {
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|error| ImageError::EncodeError(error.to_string()))?;
    Ok(png.into_inner())
}

#[cfg(feature = "svg_raster")]
fn render_svg(bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    use image::Rgba;
    use resvg::tiny_skia;
    use resvg::usvg;

    let tree = usvg::Tree::from_data(bytes, &usvg::Options::default())
        .map_err(|error| ImageError::VectorRenderError(error.to_string()))?;
    let size = tree.size().to_int_size();
    let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| ImageError::VectorRenderError(format!("empty canvas {}x{}", size.width(), size.height())))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());

    // tiny-skia stores premultiplied alpha
    let mut image = RgbaImage::new(size.width(), size.height());
    for (pixel, source) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = source.demultiply();
        *pixel = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    encode_png(image)
}

#[cfg(not(feature = "svg_raster"))]
fn render_svg(_bytes: &[u8]) -> Result<Vec<u8>, ImageError> {
    Err(ImageError::VectorConverterMissing)
}
