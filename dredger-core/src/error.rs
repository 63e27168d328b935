use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid response body: {0}")]
    InvalidBody(String),
}

impl FetchError {
    /// True when the server never answered (connection refused, DNS, timeout).
    /// An HTTP status, even an error one, is an answer.
    pub fn is_transport(&self) -> bool {
        match self {
            FetchError::RequestFailed(e) => e.status().is_none(),
            FetchError::Transport(_) => true,
            FetchError::InvalidUrl(_) | FetchError::Status(_) | FetchError::InvalidBody(_) => false,
        }
    }

    /// The HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status(code) => Some(*code),
            FetchError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Why a single JSON-LD block did not yield a recipe.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockError {
    #[error("JSON-LD block {index} is not valid JSON: {message}")]
    InvalidJson { index: usize, message: String },

    #[error("JSON-LD block {index} has no Recipe entry")]
    NotRecipe { index: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("backend refused import (HTTP {status})")]
    Refused { status: u16 },

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("no import backend enabled")]
    NoBackends,
}

impl ImportError {
    pub fn is_refusal(&self) -> bool {
        matches!(self, ImportError::Refused { .. })
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid site URL {url:?}: {message}")]
    InvalidSite { url: String, message: String },

    #[error("No import backend enabled (enable Mealie or Tandoor, or use dry run)")]
    NoBackends,

    #[error("Audit mode needs the Mealie backend to rebuild the dedup baseline")]
    AuditWithoutMealie,

    #[error("Backend listing failed at {url}: {source}")]
    BackendUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },
}
