//! Process-wide read cache with stale-while-revalidate semantics
//!
//! Entries are keyed by the exact resource path and hold the raw JSON
//! snapshot; each reader decodes into its own type. At most one request per
//! key is in flight: later readers attach to the running one.
//!
//! Writers: fetch completion (here) and `invalidate`, which only the form
//! controller calls after a successful mutation.

use dashmap::DashMap;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::client::{ResourceClient, decode};
use crate::domain::{ApiError, Method, Validate};

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Value>, ApiError>>>;

/// What a view renders for one resource key
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
    /// No data yet and a request is running
    pub is_loading: bool,
    /// A request is running, with or without stale data
    pub is_validating: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_loading: false,
            is_validating: false,
        }
    }
}

#[derive(Default)]
struct Entry {
    data: Option<Arc<Value>>,
    error: Option<ApiError>,
    in_flight: Option<(u64, SharedFetch)>,
}

struct Inner {
    client: ResourceClient,
    entries: DashMap<String, Entry>,
    next_fetch_id: AtomicU64,
}

impl Inner {
    fn complete(&self, key: &str, fetch_id: u64, result: &Result<Arc<Value>, ApiError>) {
        let Some(mut entry) = self.entries.get_mut(key) else {
            tracing::debug!(key, "Discarding result for evicted key");
            return;
        };

        // Invalidated (and possibly refetched) while this request was running
        if entry.in_flight.as_ref().map(|(id, _)| *id) != Some(fetch_id) {
            tracing::debug!(key, fetch_id, "Discarding superseded result");
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.data = Some(Arc::clone(value));
                entry.error = None;
            }
            Err(e) => {
                // Keep stale data around, SWR style
                entry.error = Some(e.clone());
            }
        }
    }
}

#[derive(Clone)]
pub struct ResourceCache {
    inner: Arc<Inner>,
}

impl ResourceCache {
    pub fn new(client: ResourceClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                entries: DashMap::new(),
                next_fetch_id: AtomicU64::new(1),
            }),
        }
    }

    pub fn client(&self) -> &ResourceClient {
        &self.inner.client
    }

    /// `useResource(key)`.
    ///
    /// `None` suspends the fetch. A cache hit returns the cached value
    /// immediately and revalidates in the background; a miss awaits the
    /// (shared) request.
    pub async fn use_resource<T>(&self, key: Option<&str>) -> ResourceState<T>
    where
        T: DeserializeOwned + Validate,
    {
        let Some(key) = key else {
            return ResourceState::default();
        };

        let (fetch, cached) = self.start_fetch(key);

        if cached {
            return self.snapshot(Some(key));
        }

        match fetch.await {
            Ok(value) => match decode::<T>((*value).clone()) {
                Ok(data) => ResourceState {
                    data: Some(data),
                    ..ResourceState::default()
                },
                Err(e) => ResourceState {
                    error: Some(e),
                    ..ResourceState::default()
                },
            },
            Err(e) => ResourceState {
                error: Some(e),
                ..ResourceState::default()
            },
        }
    }

    /// Current state of `key` without touching the network.
    pub fn snapshot<T>(&self, key: Option<&str>) -> ResourceState<T>
    where
        T: DeserializeOwned + Validate,
    {
        let Some(entry) = key.and_then(|k| self.inner.entries.get(k)) else {
            return ResourceState::default();
        };

        let is_validating = entry.in_flight.is_some();
        let mut state = ResourceState {
            data: None,
            error: entry.error.clone(),
            is_loading: is_validating && entry.data.is_none(),
            is_validating,
        };

        if let Some(value) = &entry.data {
            match decode::<T>((**value).clone()) {
                Ok(data) => state.data = Some(data),
                Err(e) => state.error = Some(e),
            }
        }

        state
    }

    /// Force a fetch of `key`, sharing any request already running.
    pub async fn revalidate(&self, key: &str) -> Result<(), ApiError> {
        let (fetch, _) = self.start_fetch(key);
        fetch.await.map(|_| ())
    }

    /// Refetch every cached key (window refocus).
    pub async fn revalidate_all(&self) {
        let keys: Vec<String> = self
            .inner
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        tracing::debug!("Revalidating {} cached keys", keys.len());

        let fetches = keys.iter().map(|key| self.start_fetch(key).0);
        futures::future::join_all(fetches).await;
    }

    /// Evict `key`. A request still running for it will not repopulate it.
    pub fn invalidate(&self, key: &str) {
        if self.inner.entries.remove(key).is_some() {
            tracing::debug!(key, "Invalidated cache entry");
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner
            .entries
            .get(key)
            .is_some_and(|entry| entry.data.is_some())
    }

    pub fn mount(&self, key: Option<&str>) -> Mount {
        Mount {
            cache: self.clone(),
            key: key.map(str::to_string),
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns the shared request for `key` and whether data was already cached.
    fn start_fetch(&self, key: &str) -> (SharedFetch, bool) {
        let mut entry = self.inner.entries.entry(key.to_string()).or_default();
        let cached = entry.data.is_some();

        if let Some((_, fetch)) = &entry.in_flight {
            tracing::debug!(key, "Attaching to in-flight request");
            return (fetch.clone(), cached);
        }

        let fetch_id = self.inner.next_fetch_id.fetch_add(1, Ordering::Relaxed);
        // A new attempt starts with a clean slate
        entry.error = None;

        let inner = Arc::clone(&self.inner);
        let task_key = key.to_string();
        // Spawned so the request outlives every reader that gives up on it
        let handle = tokio::spawn(async move {
            let result = inner
                .client
                .raw(Method::Get, &task_key, None)
                .await
                .map(Arc::new);
            inner.complete(&task_key, fetch_id, &result);
            result
        });

        let fetch = async move {
            handle
                .await
                .unwrap_or_else(|e| Err(ApiError::Network(format!("Fetch task failed: {}", e))))
        }
        .boxed()
        .shared();

        entry.in_flight = Some((fetch_id, fetch.clone()));
        (fetch, cached)
    }
}

/// View-scoped reader. Results landing after `unmount` are dropped.
#[derive(Clone)]
pub struct Mount {
    cache: ResourceCache,
    key: Option<String>,
    mounted: Arc<AtomicBool>,
}

impl Mount {
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::Acquire)
    }

    pub fn unmount(&self) {
        self.mounted.store(false, Ordering::Release);
    }

    /// `None` if the view went away before the result arrived.
    pub async fn load<T>(&self) -> Option<ResourceState<T>>
    where
        T: DeserializeOwned + Validate,
    {
        let state = self.cache.use_resource(self.key.as_deref()).await;
        self.is_mounted().then_some(state)
    }
}
