pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod form;
pub mod models;
pub mod notify;
pub mod services;
pub mod state;
pub mod telemetry;

pub use cache::{Mount, ResourceCache, ResourceState};
pub use client::ResourceClient;
pub use domain::{ApiError, ApiErrorKind, FormValidationError};
pub use form::{FormController, SubmissionState, SubmitOutcome};
pub use state::AppState;
