#![allow(dead_code)]

use async_trait::async_trait;
use bookcafe::cache::ResourceCache;
use bookcafe::client::ResourceClient;
use bookcafe::config::Config;
use bookcafe::domain::{ApiError, Method, Transport};
use bookcafe::notify::{MemoryNavigator, MemoryNotifier};
use bookcafe::state::AppState;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Semaphore;

/// Transport answering from per-path queues, optionally held at a gate.
pub struct ScriptedTransport {
    calls: AtomicUsize,
    gate: Option<Semaphore>,
    responses: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: None,
            responses: Mutex::new(HashMap::new()),
        })
    }

    /// Every request waits for a `release` before answering
    pub fn gated() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            gate: Some(Semaphore::new(0)),
            responses: Mutex::new(HashMap::new()),
        })
    }

    pub fn push(&self, path: &str, response: Result<Value, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Yield until `n` requests have reached the transport
    pub async fn wait_for_calls(&self, n: usize) {
        for _ in 0..1000 {
            if self.calls() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("expected {} calls, saw {}", n, self.calls());
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn execute(
        &self,
        _method: Method,
        path: &str,
        _body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }
        self.responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(ApiError::NotFound(format!("no script for {}", path))))
    }
}

pub fn scripted_cache(transport: &Arc<ScriptedTransport>) -> ResourceCache {
    ResourceCache::new(ResourceClient::with_transport(transport.clone()))
}

pub struct Harness {
    pub state: AppState,
    pub notifier: Arc<MemoryNotifier>,
    pub navigator: Arc<MemoryNavigator>,
}

/// App state against a real HTTP backend, with recording collaborators
pub fn harness(base_url: &str) -> Harness {
    let client = ResourceClient::new(&Config::with_base_url(base_url)).unwrap();
    harness_with(ResourceCache::new(client))
}

pub fn harness_with(cache: ResourceCache) -> Harness {
    let notifier = Arc::new(MemoryNotifier::new());
    let navigator = Arc::new(MemoryNavigator::new());
    let state = AppState::with_collaborators(cache, notifier.clone(), navigator.clone());
    Harness {
        state,
        notifier,
        navigator,
    }
}

pub fn espresso_json() -> Value {
    serde_json::json!({
        "id": 5,
        "name": "Espresso",
        "price": 45,
        "description": "short and strong",
        "imageUrl": "http://x/espresso.png"
    })
}
