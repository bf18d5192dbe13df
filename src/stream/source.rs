//! Document sources and reader settings

use crate::cache::DocumentCache;
use crate::dom::{ParseOptions, XmlDocument};
use crate::error::DocumentError;
use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{self, Component, Path, PathBuf};
use std::sync::Arc;
use url::Url;

/// Reader configuration
#[derive(Debug, Clone)]
pub struct ReaderSettings {
    /// Share materialized documents through `cache`
    pub use_cache: bool,
    /// Reject malformed structure instead of recovering
    pub strict: bool,
    pub cache: Arc<DocumentCache>,
}

impl ReaderSettings {
    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Use a private cache instead of the process-wide one
    pub fn cache(mut self, cache: Arc<DocumentCache>) -> Self {
        self.cache = cache;
        self
    }

    fn parse_options(&self) -> ParseOptions {
        if self.strict {
            ParseOptions::default()
        } else {
            ParseOptions::lenient()
        }
    }
}

impl Default for ReaderSettings {
    fn default() -> Self {
        ReaderSettings {
            use_cache: true,
            strict: true,
            cache: DocumentCache::global(),
        }
    }
}

/// Where a reader's document comes from
pub enum Source {
    /// Already materialized
    Document(Arc<XmlDocument>),
    /// Forward-only stream. With a base URI the materialized document is
    /// cached under it; without one it is anonymous and never cached.
    Stream {
        reader: Box<dyn Read + Send>,
        base_uri: Option<String>,
    },
    /// File path or `file:` URI
    Location(String),
}

impl Source {
    pub fn document(doc: Arc<XmlDocument>) -> Self {
        Source::Document(doc)
    }

    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Source::Stream {
            reader: Box::new(reader),
            base_uri: None,
        }
    }

    pub fn stream_with_base_uri(
        reader: impl Read + Send + 'static,
        base_uri: impl Into<String>,
    ) -> Self {
        Source::Stream {
            reader: Box::new(reader),
            base_uri: Some(base_uri.into()),
        }
    }

    /// Anonymous in-memory bytes
    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::stream(Cursor::new(bytes.into()))
    }

    pub fn location(location: impl Into<String>) -> Self {
        Source::Location(location.into())
    }

    /// Cache key, `None` for anonymous sources
    pub fn identifier(&self) -> Result<Option<String>, DocumentError> {
        match self {
            Source::Document(doc) => Ok(doc.base_uri().map(str::to_string)),
            Source::Stream { base_uri, .. } => {
                base_uri.as_deref().map(absolute_identifier).transpose()
            }
            Source::Location(location) => absolute_identifier(location).map(Some),
        }
    }

    /// Build (or reuse) the document this source denotes
    pub(crate) fn materialize(
        self,
        settings: &ReaderSettings,
    ) -> Result<Arc<XmlDocument>, DocumentError> {
        let options = settings.parse_options();
        match self {
            Source::Document(doc) => Ok(doc),
            Source::Stream {
                reader,
                base_uri: None,
            } => {
                tracing::debug!("materializing anonymous stream");
                Ok(Arc::new(XmlDocument::from_reader(reader, options)?))
            }
            Source::Stream {
                reader,
                base_uri: Some(base_uri),
            } => {
                let id = absolute_identifier(&base_uri)?;
                cached(settings, &id, || {
                    tracing::debug!(uri = %id, "materializing stream");
                    Ok(XmlDocument::from_reader(reader, options)?.with_base_uri(id.as_str()))
                })
            }
            Source::Location(location) => {
                let url = location_url(&location)?;
                let id = url.as_str();
                cached(settings, id, || {
                    tracing::debug!(uri = %id, "materializing location");
                    let file = File::open(file_path(&url)?)?;
                    Ok(XmlDocument::from_reader(file, options)?.with_base_uri(id))
                })
            }
        }
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Document(doc) => f.debug_tuple("Document").field(&doc.base_uri()).finish(),
            Source::Stream { base_uri, .. } => {
                f.debug_struct("Stream").field("base_uri", base_uri).finish_non_exhaustive()
            }
            Source::Location(location) => f.debug_tuple("Location").field(location).finish(),
        }
    }
}

impl From<Arc<XmlDocument>> for Source {
    fn from(doc: Arc<XmlDocument>) -> Self {
        Source::Document(doc)
    }
}

impl From<XmlDocument> for Source {
    fn from(doc: XmlDocument) -> Self {
        Source::Document(Arc::new(doc))
    }
}

fn cached<F>(
    settings: &ReaderSettings,
    id: &str,
    materialize: F,
) -> Result<Arc<XmlDocument>, DocumentError>
where
    F: FnOnce() -> Result<XmlDocument, DocumentError>,
{
    if settings.use_cache {
        settings.cache.get_or_materialize(id, materialize)
    } else {
        materialize().map(Arc::new)
    }
}

/// Absolute identifier for a path or URI, as a normalized URL string.
/// Relative paths resolve against the working directory; URIs with another
/// scheme are kept, normalized, but cannot be opened.
pub fn absolute_identifier(location: &str) -> Result<String, DocumentError> {
    location_url(location).map(String::from)
}

fn location_url(location: &str) -> Result<Url, DocumentError> {
    if location.is_empty() {
        return Err(DocumentError::invalid_location(location, "empty location"));
    }
    if has_uri_scheme(location) {
        return Url::parse(location).map_err(|err| DocumentError::invalid_location(location, err));
    }
    let absolute = normalize(&path::absolute(location)?);
    Url::from_file_path(&absolute)
        .map_err(|()| DocumentError::invalid_location(location, "not an absolute path"))
}

/// `scheme:` prefix of at least two characters, so drive letters are paths
fn has_uri_scheme(location: &str) -> bool {
    let Some((scheme, _)) = location.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    scheme.len() > 1
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Drop `.` and fold `..` components without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn file_path(url: &Url) -> Result<PathBuf, DocumentError> {
    if url.scheme() != "file" {
        return Err(DocumentError::Io(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("no handler for `{url}`"),
        )));
    }
    url.to_file_path()
        .map_err(|()| DocumentError::invalid_location(url.as_str(), "not a local path"))
}
