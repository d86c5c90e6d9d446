//! Form mutation controller
//!
//! One submission path shared by every form: validate all fields, call the
//! backend, invalidate affected reads, notify, navigate. Failures never escape
//! the submission; the controller always ends back in `Idle`.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;

use crate::cache::ResourceCache;
use crate::domain::{ApiError, ApiErrorKind, FormValidationError};
use crate::notify::{Navigator, Notification, Notifier};

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    Number(f64),
    Integer(i64),
    DateTime(DateTime<Utc>),
}

impl FieldValue {
    /// Blank text counts as empty; zero does not
    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Empty => true,
            FieldValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(n) => Some(*n as f64),
            _ => None,
        }
    }

    /// Whole numbers only; select inputs may hand ids back as text
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            FieldValue::Number(n) if n.fract() == 0.0 => Some(*n as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::DateTime(dt) => Some(*dt),
            FieldValue::Text(s) => DateTime::parse_from_rfc3339(s.trim())
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(dt: DateTime<Utc>) -> Self {
        FieldValue::DateTime(dt)
    }
}

pub type FormValues = BTreeMap<String, FieldValue>;

/// Typed reads over [`FormValues`]; missing or mistyped fields read as `None`
pub trait FieldAccess {
    fn field(&self, name: &str) -> &FieldValue;

    fn text(&self, name: &str) -> String {
        self.field(name).as_text().unwrap_or_default().to_string()
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.field(name).as_f64()
    }

    fn integer(&self, name: &str) -> Option<i64> {
        self.field(name).as_i64()
    }

    fn datetime(&self, name: &str) -> Option<DateTime<Utc>> {
        self.field(name).as_datetime()
    }
}

impl FieldAccess for FormValues {
    fn field(&self, name: &str) -> &FieldValue {
        self.get(name).unwrap_or(&FieldValue::Empty)
    }
}

pub type Validator = Box<dyn Fn(&FieldValue) -> Option<String> + Send + Sync>;

#[derive(Default)]
pub struct Validators {
    rules: BTreeMap<String, Validator>,
}

impl Validators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, validator: Validator) -> Self {
        self.rules.insert(name.into(), validator);
        self
    }

    /// Runs every rule; a missing value is validated as `Empty`.
    pub fn validate(&self, values: &FormValues) -> Result<(), FormValidationError> {
        let mut errors = FormValidationError::default();
        for (name, rule) in &self.rules {
            let value = values.get(name).unwrap_or(&FieldValue::Empty);
            if let Some(message) = rule(value) {
                errors.insert(name.clone(), message);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

pub fn is_not_empty(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &FieldValue| value.is_empty().then(|| message.clone()))
}

/// Fails on a missing or non-numeric value too
pub fn min_number(min: f64, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &FieldValue| match value.as_f64() {
        Some(n) if n >= min => None,
        _ => Some(message.clone()),
    })
}

/// Whole number of at least `min`; 1.5 or "abc" fail
pub fn min_integer(min: i64, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &FieldValue| match value.as_i64() {
        Some(n) if n >= min => None,
        _ => Some(message.clone()),
    })
}

pub fn is_datetime(message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &FieldValue| value.as_datetime().is_none().then(|| message.clone()))
}

/// Counts characters, not bytes
pub fn max_chars(max: usize, message: impl Into<String>) -> Validator {
    let message = message.into();
    Box::new(move |value: &FieldValue| match value.as_text() {
        Some(text) if text.chars().count() > max => Some(message.clone()),
        _ => None,
    })
}

/// Input-level bounds for a numeric field
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberField {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl NumberField {
    pub fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }
}

/// Field values as entered, with numeric inputs clamped on entry.
#[derive(Debug, Clone, Default)]
pub struct Form {
    values: FormValues,
    numbers: BTreeMap<String, NumberField>,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_number_field(mut self, name: impl Into<String>, field: NumberField) -> Self {
        self.numbers.insert(name.into(), field);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> &mut Self {
        let name = name.into();
        let value = match (value.into(), self.numbers.get(&name)) {
            (FieldValue::Number(n), Some(bounds)) => FieldValue::Number(bounds.clamp(n)),
            (FieldValue::Integer(n), Some(bounds)) => {
                FieldValue::Integer(bounds.clamp(n as f64).round() as i64)
            }
            (other, _) => other,
        };
        self.values.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> &FieldValue {
        self.values.field(name)
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }
}

/// Error toast copy, one entry per error kind
#[derive(Debug, Clone)]
pub struct ErrorNotices {
    validation: Notification,
    not_found: Notification,
    server: Notification,
    network: Notification,
}

impl Default for ErrorNotices {
    fn default() -> Self {
        Self {
            validation: Notification::error(
                "ข้อมูลไม่ถูกต้อง",
                "กรุณาตรวจสอบข้อมูลที่กรอกใหม่อีกครั้ง",
            ),
            not_found: Notification::error("เกิดข้อผิดพลาดบางอย่าง", "กรุณาลองใหม่อีกครั้ง"),
            server: Notification::error("เกิดข้อผิดพลาดบางอย่าง", "กรุณาลองใหม่อีกครั้ง"),
            network: Notification::error(
                "เกิดข้อผิดพลาดบางอย่าง",
                "กรุณาลองใหม่อีกครั้ง หรือดูที่ Console สำหรับข้อมูลเพิ่มเติม",
            ),
        }
    }
}

impl ErrorNotices {
    pub fn with(
        mut self,
        kind: ApiErrorKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let notice = Notification::error(title, message);
        match kind {
            ApiErrorKind::Validation => self.validation = notice,
            ApiErrorKind::NotFound => self.not_found = notice,
            ApiErrorKind::Server => self.server = notice,
            ApiErrorKind::Network => self.network = notice,
        }
        self
    }

    pub fn for_error(&self, error: &ApiError) -> Notification {
        match error.kind() {
            ApiErrorKind::Validation => self.validation.clone(),
            ApiErrorKind::NotFound => self.not_found.clone(),
            ApiErrorKind::Server => self.server.clone(),
            ApiErrorKind::Network => self.network.clone(),
        }
    }
}

/// Successful action result
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completed {
    pub navigate_to: Option<String>,
    /// Replaces the mutation's success notification when the copy depends
    /// on what was actually sent
    pub notice: Option<Notification>,
}

impl Completed {
    pub fn stay() -> Self {
        Self::default()
    }

    pub fn navigate(path: impl Into<String>) -> Self {
        Self {
            navigate_to: Some(path.into()),
            notice: None,
        }
    }

    pub fn with_notice(mut self, notice: Notification) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// A write against the backend plus everything needed to report it
pub struct Mutation<F> {
    action: F,
    invalidates: Vec<String>,
    success: Notification,
    errors: ErrorNotices,
}

impl<F, Fut> Mutation<F>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Completed, ApiError>>,
{
    pub fn new(action: F, success: Notification) -> Self {
        Self {
            action,
            invalidates: Vec::new(),
            success,
            errors: ErrorNotices::default(),
        }
    }

    /// Read key to evict once the action succeeds
    pub fn invalidates(mut self, key: impl Into<String>) -> Self {
        self.invalidates.push(key.into());
        self
    }

    pub fn errors(mut self, errors: ErrorNotices) -> Self {
        self.errors = errors;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Validating,
    Invalid,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Rejected client-side; nothing was sent
    Invalid(FormValidationError),
    Succeeded { navigated_to: Option<String> },
    Failed(ApiError),
    /// Another submission on this controller is still running
    Busy,
}

// Puts the controller back in Idle even if the submission future is dropped
struct IdleOnDrop<'a>(&'a watch::Sender<SubmissionState>);

impl Drop for IdleOnDrop<'_> {
    fn drop(&mut self) {
        self.0.send_replace(SubmissionState::Idle);
    }
}

pub struct FormController {
    cache: ResourceCache,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<SubmissionState>,
}

impl FormController {
    pub fn new(
        cache: ResourceCache,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (state, _) = watch::channel(SubmissionState::Idle);
        Self {
            cache,
            notifier,
            navigator,
            state,
        }
    }

    pub fn state(&self) -> SubmissionState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<SubmissionState> {
        self.state.subscribe()
    }

    pub fn is_processing(&self) -> bool {
        self.state() == SubmissionState::Submitting
    }

    pub async fn submit<F, Fut>(
        &self,
        values: &FormValues,
        validators: &Validators,
        mutation: Mutation<F>,
    ) -> SubmitOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Completed, ApiError>>,
    {
        let accepted = self.state.send_if_modified(|state| {
            if *state == SubmissionState::Idle {
                *state = SubmissionState::Validating;
                true
            } else {
                false
            }
        });
        if !accepted {
            tracing::debug!("Submission ignored, controller busy");
            return SubmitOutcome::Busy;
        }
        let _idle = IdleOnDrop(&self.state);

        if let Err(errors) = validators.validate(values) {
            tracing::debug!("{}", errors);
            self.state.send_replace(SubmissionState::Invalid);
            return SubmitOutcome::Invalid(errors);
        }

        self.state.send_replace(SubmissionState::Submitting);
        let Mutation {
            action,
            invalidates,
            success,
            errors,
        } = mutation;

        match action().await {
            Ok(Completed {
                navigate_to,
                notice,
            }) => {
                for key in &invalidates {
                    self.cache.invalidate(key);
                }
                self.notifier.show(notice.unwrap_or(success));
                self.state.send_replace(SubmissionState::Succeeded);

                if let Some(path) = &navigate_to {
                    self.navigator.navigate(path);
                }
                SubmitOutcome::Succeeded {
                    navigated_to: navigate_to,
                }
            }
            Err(e) => {
                tracing::warn!(kind = ?e.kind(), "Submission failed: {}", e);
                self.notifier.show(errors.for_error(&e));
                self.state.send_replace(SubmissionState::Failed);
                SubmitOutcome::Failed(e)
            }
        }
    }
}
