//! Remote key set resolution
//!
//! [`RemoteKeySet`] owns the cached key set of one JWKS endpoint. Concurrent
//! callers that need a refresh share a single in-flight fetch, which runs on
//! its own task so that cancelled callers never stall it, and a cooldown
//! after every successful refresh stops unknown key IDs from turning into a
//! request storm against the provider.

use crate::algorithm::AlgorithmType;
use crate::error::{Error, Result};
use crate::header::TokenHeader;
use crate::http::HttpClient;
use crate::jwks::KeySet;
use crate::jwks::handle::KeyHandle;
use crate::url::validate_jwks_url;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;

type PendingFetch = Shared<BoxFuture<'static, Result<Arc<KeySet>>>>;

/// Timing knobs for a [`RemoteKeySet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteKeySetOptions {
    /// Deadline for one fetch, body included
    pub timeout: Duration,
    /// Window after a successful reload in which a failed match does not refetch
    pub cooldown: Duration,
}

impl Default for RemoteKeySetOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(5000),
            cooldown: Duration::from_millis(30000),
        }
    }
}

#[derive(Default)]
struct ResolverState {
    key_set: Option<Arc<KeySet>>,
    reloaded_at: Option<Instant>,
    pending: Option<PendingFetch>,
}

struct Inner {
    url: String,
    client: Arc<dyn HttpClient>,
    options: RemoteKeySetOptions,
    state: Mutex<ResolverState>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, result: &Result<Arc<KeySet>>) {
        let mut state = self.lock();
        state.pending = None;
        match result {
            Ok(key_set) => {
                state.key_set = Some(Arc::clone(key_set));
                state.reloaded_at = Some(Instant::now());
                tracing::info!(url = %self.url, keys = key_set.len(), "installed new key set");
            }
            Err(error) => {
                tracing::warn!(url = %self.url, %error, "key set fetch failed");
            }
        }
    }
}

/// Key set resolver for one remote JWKS endpoint
///
/// Cloning shares the cache; construct one per endpoint at the composition
/// root and hand clones to every verifier that needs it.
#[derive(Clone)]
pub struct RemoteKeySet {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RemoteKeySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteKeySet")
            .field("url", &self.inner.url)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

impl RemoteKeySet {
    /// Create a resolver; nothing is fetched until the first key is needed
    pub fn new(
        url: &str,
        client: Arc<dyn HttpClient>,
        options: RemoteKeySetOptions,
    ) -> Result<Self> {
        let url = validate_jwks_url(url)?;
        if options.timeout.is_zero() {
            return Err(Error::ConfigurationInvalid(
                "fetch timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            inner: Arc::new(Inner {
                url: url.into(),
                client,
                options,
                state: Mutex::new(ResolverState::default()),
            }),
        })
    }

    /// Key set URL
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Timeout and cooldown this resolver was created with
    pub fn options(&self) -> RemoteKeySetOptions {
        self.inner.options
    }

    /// Currently cached key set, if one was ever loaded
    pub fn current(&self) -> Option<Arc<KeySet>> {
        self.inner.lock().key_set.clone()
    }

    /// Whether the last successful reload is younger than the cooldown
    pub fn cooling_down(&self) -> bool {
        self.inner
            .lock()
            .reloaded_at
            .is_some_and(|at| at.elapsed() < self.inner.options.cooldown)
    }

    /// Fetch the key set, joining the fetch already in flight if there is one
    ///
    /// Every caller that joins a fetch observes the same outcome. A failed
    /// fetch leaves the cached key set untouched.
    pub async fn reload(&self) -> Result<Arc<KeySet>> {
        let pending = {
            let mut state = self.inner.lock();
            if let Some(pending) = &state.pending {
                tracing::debug!(url = %self.inner.url, "joining in-flight key set fetch");
                pending.clone()
            } else {
                tracing::debug!(url = %self.inner.url, "fetching key set");
                let pending = self.start_fetch();
                state.pending = Some(pending.clone());
                pending
            }
        };
        pending.await
    }

    /// Spawn the fetch so it runs to completion even if every waiter is dropped
    fn start_fetch(&self) -> PendingFetch {
        // Weak so an orphaned fetch task does not keep the resolver alive
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let client = Arc::clone(&self.inner.client);
        let url = self.inner.url.clone();
        let timeout = self.inner.options.timeout;

        let task = {
            let inner = inner.clone();
            tokio::spawn(async move {
                let result = fetch_key_set(client.as_ref(), &url, timeout)
                    .await
                    .map(Arc::new);
                if let Some(inner) = inner.upgrade() {
                    inner.finish(&result);
                }
                result
            })
        };

        async move {
            task.await.unwrap_or_else(|error| {
                let result = Err(Error::FetchFailed(format!("fetch task failed: {error}")));
                if let Some(inner) = inner.upgrade() {
                    inner.finish(&result);
                }
                result
            })
        }
        .boxed()
        .shared()
    }

    /// Resolve the key that verifies a token with this header
    ///
    /// Loads the key set on first use. When no key matches and the resolver
    /// is not cooling down, the set is reloaded and matched once more.
    /// Ambiguous matches fail immediately.
    pub async fn resolve_key(&self, header: &TokenHeader) -> Result<KeyHandle> {
        let algorithm = AlgorithmType::from_str(&header.algorithm)?;

        let key_set = match self.current() {
            Some(key_set) => key_set,
            None => self.reload().await?,
        };

        match key_set.select(header, algorithm) {
            Err(Error::NoMatchingKey) if !self.cooling_down() => {
                tracing::debug!(
                    url = %self.inner.url,
                    kid = ?header.key_id,
                    "no matching key, reloading key set"
                );
                self.reload().await?.select(header, algorithm)
            }
            Err(Error::NoMatchingKey) => {
                tracing::warn!(
                    url = %self.inner.url,
                    kid = ?header.key_id,
                    "no matching key, refresh suppressed during cooldown"
                );
                Err(Error::NoMatchingKey)
            }
            other => other,
        }
    }
}

async fn fetch_key_set(client: &dyn HttpClient, url: &str, timeout: Duration) -> Result<KeySet> {
    let response = tokio::time::timeout(timeout, client.get(url))
        .await
        .map_err(|_| Error::FetchTimeout { timeout })??;

    if response.status != 200 {
        return Err(Error::FetchFailed(format!(
            "http: status {}",
            response.status
        )));
    }

    KeySet::parse(&response.body)
}
