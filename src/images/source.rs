use crate::images::ImageError;
use base64::Engine;
use serde::Deserialize;
use std::cell::RefCell;
use std::fmt::Debug;
use std::io::Read;
use std::io::Seek;
use std::io::SeekFrom;
use std::path::PathBuf;
use std::rc::Rc;

/// Prefix that marks an inline picture in the JSON input
const DATA_URI_PREFIX: &str = "data:image";

pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// A shared handle to an open, seekable byte stream.
///
/// Clones share the same underlying stream, so they also share a cache identity.
#[derive(Clone)]
pub struct ByteStream(Rc<RefCell<dyn ReadSeek>>);

impl ByteStream {
    pub fn new(reader: impl Read + Seek + 'static) -> ByteStream {
        ByteStream(Rc::new(RefCell::new(reader)))
    }

    fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    /// Reads the whole stream from the beginning
    fn read_all(&self) -> std::io::Result<Vec<u8>> {
        let mut reader = self.0.borrow_mut();
        reader.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Ok(bytes)
    }
}

impl Debug for ByteStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ByteStream({:#x})", self.identity())
    }
}

/// Where the bytes of a picture come from.
///
/// JSON strings deserialize to [`ImageSource::DataUri`] when they start with
/// `data:image` and to [`ImageSource::Path`] otherwise.
#[derive(Clone, Debug, Deserialize)]
#[serde(from = "String")]
pub enum ImageSource {
    /// `data:image/png;base64,....`
    DataUri(String),
    Path(PathBuf),
    Stream(ByteStream),
}

/// Cache identity of an [`ImageSource`]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceKey {
    DataUri(String),
    Path(PathBuf),
    Stream(usize),
}

impl ImageSource {
    pub fn key(&self) -> SourceKey {
        match self {
            ImageSource::DataUri(uri) => SourceKey::DataUri(uri.to_owned()),
            ImageSource::Path(path) => SourceKey::Path(path.to_owned()),
            ImageSource::Stream(stream) => SourceKey::Stream(stream.identity()),
        }
    }

    /// Blank strings in the input stand for "no picture"
    pub fn is_empty(&self) -> bool {
        match self {
            ImageSource::DataUri(uri) => uri.trim().is_empty(),
            ImageSource::Path(path) => path.as_os_str().is_empty(),
            ImageSource::Stream(_) => false,
        }
    }

    /// File name used to recognize vector input by extension
    pub fn name_hint(&self) -> Option<&str> {
        match self {
            ImageSource::Path(path) => path.to_str(),
            _ => None,
        }
    }

    /// Resolves the source to its raw bytes
    pub(crate) fn read_bytes(&self) -> Result<Vec<u8>, ImageError> {
        match self {
            ImageSource::DataUri(uri) => decode_data_uri(uri),
            ImageSource::Path(path) => std::fs::read(path)
                .map_err(|error| ImageError::SourceError(path.display().to_string(), error.to_string())),
            ImageSource::Stream(stream) => stream
                .read_all()
                .map_err(|error| ImageError::SourceError(format!("{stream:?}"), error.to_string())),
        }
    }
}

impl From<String> for ImageSource {
    fn from(value: String) -> Self {
        if value.starts_with(DATA_URI_PREFIX) {
            ImageSource::DataUri(value)
        } else {
            ImageSource::Path(PathBuf::from(value))
        }
    }
}

impl From<&str> for ImageSource {
    fn from(value: &str) -> Self {
        ImageSource::from(value.to_owned())
    }
}

impl From<ByteStream> for ImageSource {
    fn from(value: ByteStream) -> Self {
        ImageSource::Stream(value)
    }
}

/// Decodes the base64 payload that follows the first comma of a data URI
fn decode_data_uri(uri: &str) -> Result<Vec<u8>, ImageError> {
    let abbreviated: String = uri.chars().take(32).collect();
    let (_, payload) = uri
        .split_once(',')
        .ok_or_else(|| ImageError::InvalidDataUri(format!("missing payload in '{abbreviated}...'")))?;
    let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|error| ImageError::InvalidDataUri(format!("'{abbreviated}...': {error}")))
}
