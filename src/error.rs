//! Unified error type.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// The error type handlers return and the crate's fallible operations surface.
///
/// A handler that wants the client to see a specific status returns
/// [`Error::Http`]; everything else is treated as an unexpected failure.
/// Neither is turned into a response by the pipeline itself: that is the
/// job of a layer such as [`ErrorMapper`](crate::middleware::ErrorMapper).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Wraps any error value as an opaque failure.
    pub fn other<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        Self::Other(err.into())
    }

    /// The domain error, if this is one.
    pub fn as_http(&self) -> Option<&HttpError> {
        match self {
            Self::Http(e) => Some(e),
            _ => None,
        }
    }
}

/// A domain error: the status and message the client should see.
///
/// Serialises as `{"status": <int>, "message": <string>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpError {
    pub status: u16,
    pub message: String,
}

impl HttpError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_error_displays_its_message() {
        let err = Error::from(HttpError::new(418, "teapot"));

        assert_eq!(err.to_string(), "teapot");
        assert_eq!(err.as_http().map(|e| e.status), Some(418));
    }

    #[test]
    fn other_wraps_strings() {
        let err = Error::other("database unreachable");

        assert!(err.as_http().is_none());
        assert_eq!(err.to_string(), "database unreachable");
    }

    #[test]
    fn http_error_round_trips_through_json() {
        let parsed: HttpError =
            serde_json::from_str(r#"{"status":404,"message":"no such user"}"#).unwrap();

        assert_eq!(parsed, HttpError::new(404, "no such user"));
    }
}
