use thiserror::Error;

/// Unrecoverable application-level failure, carrying the process exit code.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Why a source adapter could not produce a series.
///
/// These never escape the adapter boundary as hard failures; see
/// [`crate::data::fetch_or_empty`].
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("unexpected payload: {0}")]
    Format(String),

    #[error("source returned no rows")]
    EmptyPayload,

    #[error("browser process failure: {0}")]
    Process(String),
}

impl FetchError {
    /// Short class label used in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport(_) | Self::Process(_) => "transport",
            Self::Format(_) => "format",
            Self::EmptyPayload => "empty",
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Format(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}
