use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegGenError {
    #[error("Object listing returned no content under prefix {0:?}")]
    DiscoveryError(String),

    #[error(transparent)]
    StorageError(#[from] opendal::Error),

    #[error("HTTP error: {0}")]
    HttpError(reqwest::StatusCode),

    #[error(transparent)]
    RequestError(#[from] reqwest::Error),

    // MPEG-DASH errors
    #[error(transparent)]
    MpdParseError(#[from] dash_mpd::DashMpdError),

    // Smooth Streaming errors
    #[error("Invalid smooth manifest: {0}")]
    SmoothParseError(#[from] quick_xml::DeError),

    #[error("Invalid m3u8 file: {0}")]
    M3u8ParseError(String),

    #[error("Missing {0} in manifest")]
    MissingField(&'static str),

    #[error("Invalid timing schema: {0}")]
    InvalidTimingSchema(String),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Resolution cancelled")]
    Cancelled,
}

/// Coarse classification used to decide whether a failure aborts the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Discovery,
    Fetch,
    Parse,
    Resolution,
    Config,
    Cancelled,
}

impl SegGenError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DiscoveryError(_) | Self::StorageError(_) => ErrorKind::Discovery,
            Self::HttpError(_) | Self::RequestError(_) => ErrorKind::Fetch,
            Self::MpdParseError(_) | Self::SmoothParseError(_) | Self::M3u8ParseError(_) => {
                ErrorKind::Parse
            }
            Self::MissingField(_) | Self::InvalidTimingSchema(_) | Self::UrlParseError(_) => {
                ErrorKind::Resolution
            }
            Self::InvalidConfig(_) => ErrorKind::Config,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Only discovery and configuration failures abort a whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Discovery | ErrorKind::Config | ErrorKind::Cancelled
        )
    }
}

pub type SegGenResult<T> = Result<T, SegGenError>;
