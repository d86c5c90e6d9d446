//! Domain layer - Pure abstractions
//!
//! This layer contains NO transport code (no reqwest calls).
//! Only the seam traits and domain error types.

pub mod errors;
pub mod transport;

pub use errors::{ApiError, ApiErrorKind, FormValidationError};
pub use transport::{Method, Transport, Validate};
