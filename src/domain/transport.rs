//! Transport trait definitions
//!
//! These traits define the contract for talking to the backend.
//! The reqwest implementation lives in the client layer.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

use super::ApiError;

/// HTTP verbs used against the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw request/response exchange with the backend.
///
/// Implementations return the decoded JSON body on 2xx (`Value::Null` for an
/// empty body) and a classified [`ApiError`] otherwise. They never retry.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError>;
}

/// Contract check applied to a decoded response before it is trusted
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        for (idx, item) in self.iter().enumerate() {
            item.validate().map_err(|e| format!("[{}]: {}", idx, e))?;
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), String> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

// Untyped payloads carry no contract of their own
impl Validate for Value {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validate for () {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}
