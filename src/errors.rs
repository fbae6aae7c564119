//! Error types for the dead queue check

use std::fmt;

pub type Result<T> = std::result::Result<T, CheckError>;

#[derive(Debug)]
pub enum CheckError {
    /// Invalid or missing configuration
    Config(String),

    /// HTTP request failed
    Http(reqwest::Error),

    /// Stats endpoint answered with a non-success status
    Status { url: String, status: u16 },

    /// Stats document could not be deserialized
    Json(serde_json::Error),
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CheckError::Http(err) => write!(f, "HTTP error: {}", err),
            CheckError::Status { url, status } => {
                write!(f, "Unexpected response {} from {}", status, url)
            }
            CheckError::Json(err) => write!(f, "JSON error: {}", err),
        }
    }
}

impl std::error::Error for CheckError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckError::Http(err) => Some(err),
            CheckError::Json(err) => Some(err),
            _ => None,
        }
    }
}

/// Innermost cause of an error chain, when it adds text the outer message lacks
pub fn root_cause(err: &(dyn std::error::Error + 'static)) -> Option<String> {
    let outer = err.to_string();
    let mut current = err.source()?;
    while let Some(next) = current.source() {
        current = next;
    }

    let cause = current.to_string();
    (!outer.contains(&cause)).then_some(cause)
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        CheckError::Http(err)
    }
}

impl From<serde_json::Error> for CheckError {
    fn from(err: serde_json::Error) -> Self {
        CheckError::Json(err)
    }
}
