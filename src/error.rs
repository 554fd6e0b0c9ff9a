/// Failure talking to the tempestd backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend was unreachable or the request timed out.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status of the failure, `None` for network-level failures.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Network(_) | Self::Decode(_) => None,
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Http { status: 404, .. })
    }
}

/// Invalid user input, rejected before any request is issued.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown time range preset: {0}")]
    UnknownPreset(String),

    #[error("Unknown unit system: {0}")]
    UnknownUnits(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Range start must be before its end")]
    EmptyRange,

    #[error("Range end lies in the future")]
    FutureEnd,

    #[error("Invalid station id: {0}")]
    InvalidStationId(String),

    #[error("Station {0} is not in the station list")]
    UnknownStation(u32),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("tempestd API error: {0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Plugin error: {0}")]
    Plugin(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;
pub type AppResult<T> = Result<T, AppError>;
