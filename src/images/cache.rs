use crate::images::ImageError;
use crate::images::ImageRasterizer;
use crate::images::ImageSource;
use crate::images::Rasterize;
use crate::images::SourceKey;
use std::collections::HashMap;

/// Which stage of the pipeline a cache entry holds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CacheSlot {
    /// Bytes as read from the source
    Raw,
    /// PNG bytes produced by the rasterizer
    Raster,
}

/// Per-request memo of resolved and rasterized pictures.
///
/// Failures are remembered too, so a broken source referenced by several entries
/// is read and decoded once. The cache is owned by a single fill call and dropped
/// with it.
pub struct ImageCache<R: Rasterize = ImageRasterizer> {
    rasterizer: R,
    entries: HashMap<(SourceKey, CacheSlot), Option<Vec<u8>>>,
}

impl ImageCache<ImageRasterizer> {
    pub fn new() -> ImageCache<ImageRasterizer> {
        ImageCache::with_rasterizer(ImageRasterizer)
    }
}

impl Default for ImageCache<ImageRasterizer> {
    fn default() -> Self {
        ImageCache::new()
    }
}

impl<R: Rasterize> ImageCache<R> {
    pub fn with_rasterizer(rasterizer: R) -> ImageCache<R> {
        ImageCache {
            rasterizer,
            entries: HashMap::new(),
        }
    }

    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    pub fn contains(&self, source: &ImageSource, slot: CacheSlot) -> bool {
        self.entries.contains_key(&(source.key(), slot))
    }

    /// Raw bytes of a source, or `None` when it cannot be read
    pub fn raw(&mut self, source: &ImageSource) -> Option<Vec<u8>> {
        let key = (source.key(), CacheSlot::Raw);
        if let Some(entry) = self.entries.get(&key) {
            return entry.clone();
        }

        let bytes = match source.read_bytes() {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                log::warn!("Skip image: {error}");
                None
            }
        };
        self.entries.insert(key, bytes.clone());
        bytes
    }

    /// PNG bytes of a source.
    ///
    /// # Returns
    /// `Ok(None)` when the picture should be skipped, `Err` only for fatal
    /// conditions such as SVG input without a vector converter
    pub fn raster(&mut self, source: &ImageSource) -> Result<Option<Vec<u8>>, ImageError> {
        let key = (source.key(), CacheSlot::Raster);
        if let Some(entry) = self.entries.get(&key) {
            return Ok(entry.clone());
        }

        let png = match self.raw(source) {
            None => None,
            Some(bytes) => match self.rasterizer.rasterize(&bytes, source.name_hint()) {
                Ok(png) => Some(png),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    log::warn!("Skip image {:?}: {error}", source.key());
                    None
                }
            },
        };
        self.entries.insert(key, png.clone());
        Ok(png)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingRasterizer {
        calls: Cell<usize>,
    }

    impl Rasterize for CountingRasterizer {
        fn rasterize(&self, bytes: &[u8], _name_hint: Option<&str>) -> Result<Vec<u8>, ImageError> {
            self.calls.set(self.calls.get() + 1);
            match bytes {
                b"svg" => Err(ImageError::VectorConverterMissing),
                b"bad" => Err(ImageError::DecodeError("bad".to_owned())),
                _ => Ok([b"png:", bytes].concat()),
            }
        }
    }

    #[test]
    fn decodes_each_source_once() {
        let mut cache = ImageCache::with_rasterizer(CountingRasterizer::default());
        let source = ImageSource::from("data:image/png;base64,aGVsbG8=");
        let first = cache.raster(&source).unwrap();
        let second = cache.raster(&source.clone()).unwrap();
        assert_eq!(first, Some(b"png:hello".to_vec()));
        assert_eq!(first, second);
        assert_eq!(cache.rasterizer().calls.get(), 1);
        assert!(cache.contains(&source, CacheSlot::Raw));
        assert!(cache.contains(&source, CacheSlot::Raster));
    }

    #[test]
    fn remembers_skipped_sources() {
        let mut cache = ImageCache::with_rasterizer(CountingRasterizer::default());
        let bad = ImageSource::from("data:image/png;base64,YmFk");
        assert_eq!(cache.raster(&bad).unwrap(), None);
        assert_eq!(cache.raster(&bad).unwrap(), None);
        assert_eq!(cache.rasterizer().calls.get(), 1);

        let missing = ImageSource::from("/no/such/photo.jpg");
        assert_eq!(cache.raster(&missing).unwrap(), None);
        assert_eq!(cache.rasterizer().calls.get(), 1);
    }

    #[test]
    fn propagates_fatal_errors() {
        let mut cache = ImageCache::with_rasterizer(CountingRasterizer::default());
        let svg = ImageSource::from("data:image/svg+xml;base64,c3Zn");
        assert!(matches!(cache.raster(&svg), Err(ImageError::VectorConverterMissing)));
        assert!(!cache.contains(&svg, CacheSlot::Raster));
    }
}
