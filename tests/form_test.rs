mod common;

use bookcafe::ApiError;
use bookcafe::cache::ResourceCache;
use bookcafe::form::{
    Completed, FieldValue, FormController, FormValues, Mutation, SubmissionState, SubmitOutcome,
    Validators, is_not_empty,
};
use bookcafe::models::Beverage;
use bookcafe::notify::{MemoryNavigator, MemoryNotifier, Notification, Notifier, Severity};
use common::{ScriptedTransport, espresso_json, scripted_cache};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

fn controller(cache: ResourceCache) -> (FormController, Arc<MemoryNotifier>, Arc<MemoryNavigator>) {
    let notifier = Arc::new(MemoryNotifier::new());
    let navigator = Arc::new(MemoryNavigator::new());
    let controller = FormController::new(cache, notifier.clone(), navigator.clone());
    (controller, notifier, navigator)
}

fn name_required() -> Validators {
    Validators::new().field("name", is_not_empty("กรุณากรอกชื่อ"))
}

fn named(name: &str) -> FormValues {
    FormValues::from([("name".to_string(), FieldValue::from(name))])
}

fn done() -> Notification {
    Notification::success("สำเร็จ", "บันทึกแล้ว")
}

/// Records whether the watched key was still cached when each toast showed
struct ProbeNotifier {
    cache: ResourceCache,
    key: &'static str,
    cached_at_show: Mutex<Vec<bool>>,
}

impl Notifier for ProbeNotifier {
    fn show(&self, _notification: Notification) {
        self.cached_at_show
            .lock()
            .unwrap()
            .push(self.cache.contains(self.key));
    }
}

#[tokio::test]
async fn test_invalid_form_never_calls_action() {
    let (controller, notifier, navigator) = controller(scripted_cache(&ScriptedTransport::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let outcome = controller
        .submit(
            &named("  "),
            &name_required(),
            Mutation::new(
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ApiError>(Completed::stay())
                },
                done(),
            ),
        )
        .await;

    let SubmitOutcome::Invalid(errors) = outcome else {
        panic!("expected validation failure, got {:?}", outcome);
    };
    assert_eq!(errors.get("name"), Some("กรุณากรอกชื่อ"));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(notifier.shown().is_empty());
    assert!(navigator.visited().is_empty());
    assert_eq!(controller.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_success_invalidates_before_notifying() {
    let transport = ScriptedTransport::new();
    transport.push("/beverages", Ok(json!([espresso_json()])));
    let cache = scripted_cache(&transport);
    cache
        .use_resource::<Vec<Beverage>>(Some("/beverages"))
        .await;
    assert!(cache.contains("/beverages"));

    let probe = Arc::new(ProbeNotifier {
        cache: cache.clone(),
        key: "/beverages",
        cached_at_show: Mutex::new(Vec::new()),
    });
    let navigator = Arc::new(MemoryNavigator::new());
    let controller = FormController::new(cache.clone(), probe.clone(), navigator.clone());

    let outcome = controller
        .submit(
            &named("Latte"),
            &name_required(),
            Mutation::new(|| async { Ok::<_, ApiError>(Completed::navigate("/menu")) }, done())
                .invalidates("/beverages"),
        )
        .await;

    assert_eq!(
        outcome,
        SubmitOutcome::Succeeded {
            navigated_to: Some("/menu".into())
        }
    );
    assert_eq!(*probe.cached_at_show.lock().unwrap(), vec![false]);
    assert_eq!(navigator.visited(), vec!["/menu".to_string()]);
}

#[tokio::test]
async fn test_failure_shows_exactly_one_error_and_stays_put() {
    let (controller, notifier, navigator) = controller(scripted_cache(&ScriptedTransport::new()));

    let outcome = controller
        .submit(
            &named("Latte"),
            &name_required(),
            Mutation::new(
                || async { Err::<Completed, _>(ApiError::from_status(500, "boom")) },
                done(),
            ),
        )
        .await;

    assert!(matches!(outcome, SubmitOutcome::Failed(ApiError::Server { .. })));
    let shown = notifier.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].severity, Severity::Error);
    assert!(navigator.visited().is_empty());
    assert_eq!(controller.state(), SubmissionState::Idle);
}

#[tokio::test]
async fn test_retry_after_failure_succeeds_once() {
    let (controller, notifier, navigator) = controller(scripted_cache(&ScriptedTransport::new()));
    let attempts = Arc::new(AtomicUsize::new(0));

    for _ in 0..2 {
        let attempts = attempts.clone();
        controller
            .submit(
                &named("Latte"),
                &name_required(),
                Mutation::new(
                    move || async move {
                        if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                            Err(ApiError::Network("offline".into()))
                        } else {
                            Ok::<_, ApiError>(Completed::navigate("/menu"))
                        }
                    },
                    done(),
                ),
            )
            .await;
    }

    let severities: Vec<Severity> = notifier.shown().iter().map(|n| n.severity).collect();
    assert_eq!(severities, vec![Severity::Error, Severity::Success]);
    assert_eq!(navigator.visited(), vec!["/menu".to_string()]);
}

#[tokio::test]
async fn test_processing_flag_tracks_the_action() {
    let (controller, _, _) = controller(scripted_cache(&ScriptedTransport::new()));
    let seen_submitting = Arc::new(AtomicBool::new(false));
    assert!(!controller.is_processing());

    let states = controller.subscribe();
    let seen = seen_submitting.clone();
    controller
        .submit(
            &named("Latte"),
            &name_required(),
            Mutation::new(
                move || async move {
                    seen.store(
                        *states.borrow() == SubmissionState::Submitting,
                        Ordering::SeqCst,
                    );
                    Ok::<_, ApiError>(Completed::stay())
                },
                done(),
            ),
        )
        .await;

    assert!(seen_submitting.load(Ordering::SeqCst));
    assert!(!controller.is_processing());
}

#[tokio::test]
async fn test_second_submit_while_running_is_rejected() {
    let (controller, notifier, _) = controller(scripted_cache(&ScriptedTransport::new()));
    let gate = Arc::new(Notify::new());
    let values = named("Latte");
    let validators = name_required();

    let first = {
        let gate = gate.clone();
        controller.submit(
            &values,
            &validators,
            Mutation::new(
                move || async move {
                    gate.notified().await;
                    Ok::<_, ApiError>(Completed::stay())
                },
                done(),
            ),
        )
    };
    let second = async {
        let outcome = controller
            .submit(
                &values,
                &validators,
                Mutation::new(|| async { Ok::<_, ApiError>(Completed::stay()) }, done()),
            )
            .await;
        gate.notify_one();
        outcome
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, SubmitOutcome::Succeeded { navigated_to: None });
    assert_eq!(second, SubmitOutcome::Busy);
    assert_eq!(notifier.shown().len(), 1);
}

#[tokio::test]
async fn test_dropped_submission_returns_to_idle() {
    let (controller, notifier, _) = controller(scripted_cache(&ScriptedTransport::new()));
    let values = named("Latte");
    let validators = name_required();

    {
        let pending = controller.submit(
            &values,
            &validators,
            Mutation::new(
                || std::future::pending::<Result<Completed, ApiError>>(),
                done(),
            ),
        );
        tokio::pin!(pending);
        let polled = futures::poll!(pending.as_mut());
        assert!(polled.is_pending());
        assert!(controller.is_processing());
    }

    assert_eq!(controller.state(), SubmissionState::Idle);
    assert!(notifier.shown().is_empty());
}
