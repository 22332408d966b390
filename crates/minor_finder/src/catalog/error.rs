//! Error types for the catalog data source.

use thiserror::Error;

/// Errors that can occur while reading the course catalog.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Network/HTTP request failed
    #[error("Network error: {message}")]
    Network { message: String },

    /// Server answered with something other than the expected page
    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    /// Page did not have the expected structure
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// URL parsing/joining failed
    #[error("URL error: {message}")]
    Url { message: String },

    /// Reading a local snapshot failed
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Snapshot JSON was malformed
    #[error("Invalid catalog snapshot: {message}")]
    Json { message: String },

    /// No entry for the requested page
    #[error("No catalog page for {url}")]
    NotFound { url: String },
}

impl CatalogError {
    /// Returns true if this error is potentially transient and retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CatalogError::Network { .. } | CatalogError::UnexpectedResponse { .. }
        )
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::Url {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Json {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(CatalogError::Network {
            message: "reset".into()
        }
        .is_retryable());
        assert!(!CatalogError::Parse {
            message: "no headings".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_url_error_conversion() {
        let err: CatalogError = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, CatalogError::Url { .. }));
    }
}
