use thiserror::Error;

/// Failure talking to an external collaborator
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{service} request failed: {message}")]
    Request { service: &'static str, message: String },

    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("{service} rejected the credentials")]
    Unauthorized { service: &'static str },

    #[error("{service}: {what} not found")]
    NotFound { service: &'static str, what: String },

    #[error("{service} response could not be decoded: {message}")]
    Decode { service: &'static str, message: String },

    #[error("{0} is not configured")]
    NotConfigured(&'static str),
}

impl SourceError {
    /// Map a transport error, keeping timeouts distinguishable
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout { service }
        } else if err.is_decode() {
            SourceError::Decode {
                service,
                message: err.to_string(),
            }
        } else {
            SourceError::Request {
                service,
                message: err.to_string(),
            }
        }
    }

    /// Map a non-success HTTP status
    pub fn from_status(service: &'static str, status: reqwest::StatusCode, body: String, what: &str) -> Self {
        match status.as_u16() {
            401 | 403 => SourceError::Unauthorized { service },
            404 => SourceError::NotFound {
                service,
                what: what.to_string(),
            },
            code => SourceError::Status {
                service,
                status: code,
                body,
            },
        }
    }

    pub fn is_auth_error(&self) -> bool {
        matches!(self, SourceError::Unauthorized { .. } | SourceError::NotConfigured(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound { .. })
    }
}

pub type SourceResult<T> = Result<T, SourceError>;
