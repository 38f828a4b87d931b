use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use arc_swap::ArcSwap;
use async_trait::async_trait;
use keygate::{
    error::{self, ResolveError},
    jwk::KeyIdRef,
    Jwks, KeyResolver, SigningKey,
};
use keygate_clock::{Clock, DurationSecs, System, UnixTime};
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};

use crate::{FetchError, KeySet, KeySource};

/// A callback notified of every failed refresh
pub type RefreshObserver = Arc<dyn Fn(&FetchError) + Send + Sync + 'static>;

/// Timing and behavior settings for a [`KeySetCache`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    /// How often the key set is refreshed independent of traffic
    pub refresh_interval: Duration,

    /// The minimum spacing between refreshes forced by an unknown key ID
    pub refresh_rate_limit: Duration,

    /// How long a single fetch may take before it is abandoned
    pub fetch_timeout: Duration,

    /// Whether an unknown key ID forces a refresh before failing
    pub refresh_unknown_kid: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60 * 60),
            refresh_rate_limit: Duration::from_secs(5 * 60),
            fetch_timeout: Duration::from_secs(10),
            refresh_unknown_kid: true,
        }
    }
}

impl CacheConfig {
    /// Sets the passive refresh interval
    #[must_use]
    pub fn with_refresh_interval(self, refresh_interval: Duration) -> Self {
        Self {
            refresh_interval,
            ..self
        }
    }

    /// Sets the minimum spacing between forced refreshes
    #[must_use]
    pub fn with_refresh_rate_limit(self, refresh_rate_limit: Duration) -> Self {
        Self {
            refresh_rate_limit,
            ..self
        }
    }

    /// Sets the fetch timeout
    #[must_use]
    pub fn with_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    /// Sets whether an unknown key ID forces a refresh
    #[must_use]
    pub fn with_refresh_unknown_kid(self, refresh_unknown_kid: bool) -> Self {
        Self {
            refresh_unknown_kid,
            ..self
        }
    }
}

type Outcome = Result<Arc<KeySet>, FetchError>;

#[derive(Default)]
struct RefreshState {
    last_forced: Option<UnixTime>,
    last_outcome: Option<Outcome>,
}

struct Inner<S, C> {
    source: S,
    clock: C,
    config: CacheConfig,
    on_refresh_error: RefreshObserver,
    current: ArcSwap<KeySet>,
    state: Mutex<RefreshState>,
    attempts: AtomicU64,
    last_attempt: AtomicU64,
    refreshing: AtomicBool,
}

/// A cache of signing keys fetched from a [`KeySource`]
///
/// Lookups read an immutable [`KeySet`] snapshot without locking. At most
/// one fetch is in flight at any time; callers that need a refresh while
/// one is running wait for it and share its outcome.
///
/// The cache is a cheap handle. Clones share the same keys and refresh
/// state.
///
/// # Example
///
/// ```no_run
/// use keygate::jwt::CoreValidator;
/// use keygate_jwks::{KeySetCache, RemoteKeySource};
///
/// # async fn run(token: &keygate::JwtRef) -> Result<(), Box<dyn std::error::Error>> {
/// let source = RemoteKeySource::new("https://issuer.example/.well-known/jwks.json")?;
/// let cache = KeySetCache::new(source);
/// let _refresh = cache.spawn_passive_refresh();
///
/// let validated = CoreValidator::default().validate(token, &cache).await?;
/// println!("subject: {:?}", validated.claims().sub());
/// # Ok(())
/// # }
/// ```
#[must_use]
pub struct KeySetCache<S, C = System> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for KeySetCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: KeySource, C> fmt::Debug for KeySetCache<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let current = self.inner.current.load();
        f.debug_struct("KeySetCache")
            .field("source", &self.inner.source.location())
            .field("config", &self.inner.config)
            .field("keys", &current.len())
            .field("fetched_at", &current.fetched_at())
            .finish_non_exhaustive()
    }
}

/// Configures a [`KeySetCache`] before it is built
#[must_use]
pub struct KeySetCacheBuilder<S, C = System> {
    source: S,
    clock: C,
    config: CacheConfig,
    on_refresh_error: Option<RefreshObserver>,
}

impl<S: KeySource, C: fmt::Debug> fmt::Debug for KeySetCacheBuilder<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("KeySetCacheBuilder")
            .field("source", &self.source.location())
            .field("clock", &self.clock)
            .field("config", &self.config)
            .field("on_refresh_error", &self.on_refresh_error.is_some())
            .finish()
    }
}

impl<S, C> KeySetCacheBuilder<S, C> {
    /// Sets the timing and behavior settings
    pub fn config(self, config: CacheConfig) -> Self {
        Self { config, ..self }
    }

    /// Replaces the clock used for staleness and rate limiting
    pub fn clock<D: Clock>(self, clock: D) -> KeySetCacheBuilder<S, D> {
        KeySetCacheBuilder {
            source: self.source,
            clock,
            config: self.config,
            on_refresh_error: self.on_refresh_error,
        }
    }

    /// Sets the callback notified of failed refreshes
    ///
    /// By default failures are logged as warnings.
    pub fn on_refresh_error<F>(self, observer: F) -> Self
    where
        F: Fn(&FetchError) + Send + Sync + 'static,
    {
        Self {
            on_refresh_error: Some(Arc::new(observer)),
            ..self
        }
    }

    /// Builds an empty cache; the first lookup loads it
    pub fn build(self) -> KeySetCache<S, C> {
        let on_refresh_error: RefreshObserver = match self.on_refresh_error {
            Some(observer) => observer,
            None => Arc::new(log_refresh_error),
        };

        KeySetCache {
            inner: Arc::new(Inner {
                source: self.source,
                clock: self.clock,
                config: self.config,
                on_refresh_error,
                current: ArcSwap::from_pointee(KeySet::default()),
                state: Mutex::new(RefreshState::default()),
                attempts: AtomicU64::new(0),
                last_attempt: AtomicU64::new(0),
                refreshing: AtomicBool::new(false),
            }),
        }
    }
}

fn log_refresh_error(err: &FetchError) {
    let error: &dyn std::error::Error = err;
    tracing::warn!(error, "JWKS refresh failed; keeping previous key set");
}

impl<S: KeySource> KeySetCache<S> {
    /// Constructs a cache over `source` with default settings
    pub fn new(source: S) -> Self {
        Self::builder(source).build()
    }

    /// Starts configuring a cache over `source`
    pub fn builder(source: S) -> KeySetCacheBuilder<S> {
        KeySetCacheBuilder {
            source,
            clock: System,
            config: CacheConfig::default(),
            on_refresh_error: None,
        }
    }
}

impl<S, C> KeySetCache<S, C>
where
    S: KeySource + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// The current key set snapshot
    ///
    /// Before the first successful fetch this is an empty, unloaded set.
    #[must_use]
    pub fn current(&self) -> Arc<KeySet> {
        self.inner.current.load_full()
    }

    /// The settings this cache was built with
    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// The key source behind this cache
    #[must_use]
    pub fn source(&self) -> &S {
        &self.inner.source
    }

    /// Replaces the current key set
    ///
    /// The replacement counts as a fresh load for passive refresh purposes.
    pub fn set_key_set(&self, jwks: Jwks) {
        let now = self.inner.clock.now();
        self.inner
            .current
            .store(Arc::new(KeySet::from_jwks(jwks, now)));
        self.inner.last_attempt.store(now.0, Ordering::Release);
    }

    /// Fetches the key set from the source and swaps it in
    ///
    /// If a refresh is already running, this waits for it and returns its
    /// outcome instead of fetching again. On failure the previous key set
    /// stays in place and the refresh observer is notified.
    ///
    /// # Errors
    ///
    /// The fetch failed or timed out.
    #[tracing::instrument(skip(self), fields(jwks.url = tracing::field::Empty))]
    pub async fn refresh(&self) -> Result<Arc<KeySet>, FetchError> {
        tracing::Span::current().record("jwks.url", self.inner.source.location());
        self.refresh_after(self.inner.attempts.load(Ordering::Acquire))
            .await
    }

    /// Looks up the signing key for `kid`
    ///
    /// The first lookup loads the key set. An unknown `kid` forces a refresh
    /// unless one was forced within the rate limit window or the behavior is
    /// disabled. A stale key set triggers a refresh in the background while
    /// the current snapshot answers this lookup.
    ///
    /// # Errors
    ///
    /// No key set could be loaded, or no key is known under `kid`.
    #[tracing::instrument(skip(self, kid), fields(jwk.kid = %kid))]
    pub async fn resolve(&self, kid: &KeyIdRef) -> Result<Arc<SigningKey>, ResolveError> {
        self.ensure_loaded()
            .await
            .map_err(error::key_source_unavailable)?;

        // attempts are counted after the swap, so `set` is at least as new as `seen`
        let seen = self.inner.attempts.load(Ordering::Acquire);
        let set = self.current();

        self.refresh_if_stale(seen);

        if let Some(key) = set.get(kid) {
            return Ok(key);
        }

        if self.inner.config.refresh_unknown_kid {
            if let Some(Err(err)) = self.forced_refresh(seen).await {
                tracing::debug!(error = %err, "forced JWKS refresh failed");
            }

            if let Some(key) = self.current().get(kid) {
                return Ok(key);
            }
        }

        tracing::debug!("no key found for kid");
        Err(error::unknown_key_id(Some(kid.to_owned())).into())
    }

    /// Spawns a task that refreshes the key set every
    /// [`refresh_interval`][CacheConfig::refresh_interval]
    ///
    /// The task runs until the returned handle is dropped or aborted.
    pub fn spawn_passive_refresh(&self) -> RefreshHandle {
        let this = self.clone();
        let period = self
            .inner
            .config
            .refresh_interval
            .max(Duration::from_millis(1));

        let task = tokio::spawn(async move {
            let mut timer = tokio::time::interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            timer.tick().await;

            loop {
                timer.tick().await;
                // failures reach the observer; try again next tick
                let _ = this.refresh().await;
            }
        });

        RefreshHandle { task }
    }

    async fn ensure_loaded(&self) -> Result<Arc<KeySet>, FetchError> {
        let current = self.inner.current.load_full();
        if current.is_loaded() {
            return Ok(current);
        }

        let seen = self.inner.attempts.load(Ordering::Acquire);
        let mut state = self.inner.state.lock().await;

        let current = self.inner.current.load_full();
        if current.is_loaded() {
            return Ok(current);
        }

        if self.inner.attempts.load(Ordering::Acquire) != seen {
            if let Some(Err(err)) = &state.last_outcome {
                return Err(err.clone());
            }
        }

        tracing::debug!("loading initial key set");
        self.refresh_locked(&mut state).await
    }

    /// Refreshes unless an attempt completed after `seen`, in which case
    /// that attempt's outcome is shared
    async fn refresh_after(&self, seen: u64) -> Outcome {
        let mut state = self.inner.state.lock().await;

        if self.inner.attempts.load(Ordering::Acquire) != seen {
            if let Some(outcome) = &state.last_outcome {
                return outcome.clone();
            }
        }

        self.refresh_locked(&mut state).await
    }

    async fn forced_refresh(&self, seen: u64) -> Option<Outcome> {
        let mut state = self.inner.state.lock().await;

        if self.inner.attempts.load(Ordering::Acquire) != seen {
            return state.last_outcome.clone();
        }

        let now = self.inner.clock.now();
        if let Some(last) = state.last_forced {
            if now.saturating_since(last) < DurationSecs::from(self.inner.config.refresh_rate_limit)
            {
                tracing::debug!("forced JWKS refresh suppressed by rate limit");
                return None;
            }
        }

        state.last_forced = Some(now);
        Some(self.refresh_locked(&mut state).await)
    }

    async fn refresh_locked(&self, state: &mut RefreshState) -> Outcome {
        let inner = &*self.inner;
        inner
            .last_attempt
            .store(inner.clock.now().0, Ordering::Release);

        let timeout = inner.config.fetch_timeout;
        let fetched = tokio::time::timeout(timeout, inner.source.fetch())
            .await
            .unwrap_or(Err(FetchError::Timeout(timeout)));

        let outcome = match fetched {
            Ok(jwks) => {
                let set = Arc::new(KeySet::from_jwks(jwks, inner.clock.now()));
                inner.current.store(Arc::clone(&set));
                tracing::info!(
                    jwks.url = inner.source.location(),
                    jwks.keys = set.len(),
                    "JWKS refreshed"
                );
                Ok(set)
            }
            Err(err) => {
                (inner.on_refresh_error)(&err);
                Err(err)
            }
        };

        state.last_outcome = Some(outcome.clone());
        inner.attempts.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    fn refresh_if_stale(&self, seen: u64) {
        let inner = &*self.inner;
        let last_attempt = UnixTime(inner.last_attempt.load(Ordering::Acquire));
        let age = inner.clock.now().saturating_since(last_attempt);

        if age < DurationSecs::from(inner.config.refresh_interval) {
            return;
        }

        if inner.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }

        tracing::debug!(age = age.0, "key set is stale; refreshing in background");
        let this = self.clone();
        tokio::spawn(async move {
            let _clear = ClearOnDrop(&this.inner.refreshing);
            let _ = this.refresh_after(seen).await;
        });
    }
}

/// Lowers a flag when dropped, including when the owning task panics
struct ClearOnDrop<'a>(&'a AtomicBool);

impl Drop for ClearOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[async_trait]
impl<S, C> KeyResolver for KeySetCache<S, C>
where
    S: KeySource + 'static,
    C: Clock + Send + Sync + 'static,
{
    async fn resolve(&self, kid: &KeyIdRef) -> Result<Arc<SigningKey>, ResolveError> {
        KeySetCache::resolve(self, kid).await
    }
}

/// A handle to a passive refresh task
///
/// Dropping the handle stops the task.
#[derive(Debug)]
#[must_use = "the refresh task stops when the handle is dropped"]
pub struct RefreshHandle {
    task: JoinHandle<()>,
}

impl RefreshHandle {
    /// Stops the refresh task
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Whether the refresh task has stopped
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use keygate::test_util::{jwks_of, TestSigner};

    use super::*;
    use crate::StaticKeySource;

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.refresh_interval, Duration::from_secs(3600));
        assert_eq!(config.refresh_rate_limit, Duration::from_secs(300));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert!(config.refresh_unknown_kid);
    }

    #[tokio::test]
    async fn starts_unloaded_and_loads_on_first_lookup() -> Result<()> {
        let signer = TestSigner::es256("k1")?;
        let cache = KeySetCache::new(StaticKeySource::new(jwks_of([&signer])));

        assert!(!cache.current().is_loaded());

        let key = cache.resolve(KeyIdRef::from_str("k1")).await?;
        assert_eq!(*key, signer.signing_key());
        assert!(cache.current().is_loaded());
        Ok(())
    }

    #[test]
    fn debug_does_not_require_debug_source() {
        let cache = KeySetCache::new(StaticKeySource::default());
        let rendered = format!("{cache:?}");
        assert!(rendered.contains("<static>"));
    }
}
