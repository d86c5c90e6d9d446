//! Domain error types
//!
//! These errors are transport-agnostic and classify every way a call to the
//! backend can fail. The HTTP status is the only signal used.

use std::collections::BTreeMap;
use std::fmt;

/// Classified failure of a backend call.
///
/// `Clone` because a single in-flight read result is handed to every reader
/// attached to it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Server answered 400: the payload failed server-side validation
    Validation(String),
    /// Server answered 404: the referenced entity does not exist
    NotFound(String),
    /// Server answered >= 500, an unexpected status, or a body we could not trust
    Server {
        status: Option<u16>,
        message: String,
    },
    /// The request never produced a response
    Network(String),
}

/// Field-less discriminant of [`ApiError`], used to pick notification copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiErrorKind {
    Validation,
    NotFound,
    Server,
    Network,
}

impl ApiError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            400 => ApiError::Validation(message),
            404 => ApiError::NotFound(message),
            // Anything else (5xx, 401, 409, ...) lands in the same bucket
            _ => ApiError::Server {
                status: Some(status),
                message,
            },
        }
    }

    /// A 2xx response whose body broke the contract.
    pub fn malformed(message: impl Into<String>) -> Self {
        ApiError::Server {
            status: None,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ApiErrorKind {
        match self {
            ApiError::Validation(_) => ApiErrorKind::Validation,
            ApiError::NotFound(_) => ApiErrorKind::NotFound,
            ApiError::Server { .. } => ApiErrorKind::Server,
            ApiError::Network(_) => ApiErrorKind::Network,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation(_) => Some(400),
            ApiError::NotFound(_) => Some(404),
            ApiError::Server { status, .. } => *status,
            ApiError::Network(_) => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Server {
                status: Some(status),
                message,
            } => write!(f, "Server error ({}): {}", status, message),
            ApiError::Server {
                status: None,
                message,
            } => write!(f, "Server error: {}", message),
            ApiError::Network(msg) => write!(f, "Network error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

// Conversion from reqwest errors (used in the client layer)
impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ApiError::from_status(status.as_u16(), e.to_string()),
            None if e.is_decode() => ApiError::malformed(e.to_string()),
            None => ApiError::Network(e.to_string()),
        }
    }
}

/// Client-side validation failure. Never reaches the network.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValidationError {
    /// Field name -> message, ordered by field name
    pub fields: BTreeMap<String, String>,
}

impl FormValidationError {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }
}

impl fmt::Display for FormValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Form validation failed: ")?;
        let mut first = true;
        for (field, msg) in &self.fields {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, msg)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for FormValidationError {}
