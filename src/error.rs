use thiserror::Error;

/// Failures surfaced by the standings client.
///
/// Remote-call failures are caught where the call is made and turned into a
/// status line; `UnknownMode` means a caller offered a mode the registry does
/// not know.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StandingsError {
    #[error("network error: {0}")]
    Network(String),
    #[error("http {status}: {message}")]
    RemoteRejection { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("unknown competition mode: {0:?}")]
    UnknownMode(String),
}

pub type StandingsResult<T> = Result<T, StandingsError>;

impl StandingsError {
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Network(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedResponse(err.to_string())
    }

    /// Server-supplied text worth showing verbatim, if any.
    pub fn remote_message(&self) -> Option<&str> {
        match self {
            Self::RemoteRejection { message, .. } => {
                let trimmed = message.trim();
                (!trimmed.is_empty()).then_some(trimmed)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StandingsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::malformed(err)
        } else {
            Self::network(err)
        }
    }
}
