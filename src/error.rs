use thiserror::Error;

/// Errors that can occur while loading, parsing or playing a VAST ad
#[derive(Error, Debug)]
pub enum AdError {
    #[error("Failed to parse XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid VAST document: {0}")]
    Parse(String),

    #[error("Media failed to load: {0}")]
    MediaLoad(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Failed to fetch VAST document: {0}")]
    Fetch(String),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

impl AdError {
    /// Malformed XML and structurally incomplete documents are both parse failures
    pub fn is_parse_error(&self) -> bool {
        matches!(self, AdError::Xml(_) | AdError::Parse(_))
    }

    /// Short stable code for logs
    pub fn code(&self) -> &'static str {
        match self {
            AdError::Xml(_) | AdError::Parse(_) => "PARSE",
            AdError::MediaLoad(_) => "MEDIA_LOAD",
            AdError::Config(_) => "CONFIG",
            AdError::Fetch(_) => "FETCH",
            AdError::Url(_) => "URL",
            AdError::Io(_) => "IO",
        }
    }

    /// Value substituted for the `[ERRORCODE]` macro in VAST error URLs
    pub fn vast_error_code(&self) -> u16 {
        match self {
            AdError::Xml(_) | AdError::Parse(_) => 100,
            AdError::MediaLoad(_) => 400,
            AdError::Fetch(_) | AdError::Url(_) | AdError::Io(_) => 301,
            AdError::Config(_) => 900,
        }
    }
}

pub type Result<T> = std::result::Result<T, AdError>;
