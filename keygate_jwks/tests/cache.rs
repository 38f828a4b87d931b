use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use color_eyre::Result;
use keygate::{
    error::ResolveError,
    jwk::KeyIdRef,
    jwt::{Claims, CoreValidator},
    test_util::{jwks_of, TestSigner},
    Jwks,
};
use keygate_clock::{TestClock, UnixTime};
use keygate_jwks::{CacheConfig, FetchError, KeySetCache, KeySource};
use tracing_test::traced_test;

const START: UnixTime = UnixTime(1_700_000_000);

#[derive(Debug)]
struct Scripted {
    fetches: AtomicUsize,
    response: Mutex<Result<Jwks, FetchError>>,
    delay: Duration,
}

impl Scripted {
    fn serving(jwks: Jwks) -> Arc<Self> {
        Self::with_delay(Ok(jwks), Duration::ZERO)
    }

    fn failing(err: FetchError) -> Arc<Self> {
        Self::with_delay(Err(err), Duration::ZERO)
    }

    fn with_delay(response: Result<Jwks, FetchError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fetches: AtomicUsize::new(0),
            response: Mutex::new(response),
            delay,
        })
    }

    fn set(&self, response: Result<Jwks, FetchError>) {
        *self.response.lock().unwrap() = response;
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySource for Scripted {
    async fn fetch(&self) -> Result<Jwks, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response.lock().unwrap().clone()
    }

    fn location(&self) -> &str {
        "scripted"
    }
}

fn cache_over(
    source: &Arc<Scripted>,
    config: CacheConfig,
) -> (KeySetCache<Arc<Scripted>, TestClock>, TestClock) {
    let clock = TestClock::new(START);
    let cache = KeySetCache::builder(Arc::clone(source))
        .config(config)
        .clock(clock.clone())
        .build();
    (cache, clock)
}

fn kid(s: &str) -> &KeyIdRef {
    KeyIdRef::from_str(s)
}

#[tokio::test]
async fn first_lookup_fetches_once() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    let first = cache.resolve(kid("k0")).await?;
    let second = cache.resolve(kid("k0")).await?;

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(source.fetches(), 1);
    Ok(())
}

#[tokio::test]
async fn unknown_kid_after_recent_forced_refresh_fails_without_fetching() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, clock) = cache_over(&source, CacheConfig::default());

    let err = cache.resolve(kid("k1")).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnknownKeyId(ref e) if e.kid() == Some(kid("k1"))));
    assert_eq!(source.fetches(), 2, "initial load plus one forced refresh");

    clock.inc(1);

    let err = cache.resolve(kid("k1")).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnknownKeyId(_)));
    assert_eq!(source.fetches(), 2);
    Ok(())
}

#[tokio::test]
async fn forced_refresh_is_allowed_again_after_the_window() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, clock) = cache_over(
        &source,
        CacheConfig::default().with_refresh_rate_limit(Duration::from_secs(300)),
    );

    let _ = cache.resolve(kid("k1")).await;
    assert_eq!(source.fetches(), 2);

    clock.inc(299);
    let _ = cache.resolve(kid("k1")).await;
    assert_eq!(source.fetches(), 2);

    clock.inc(1);
    let _ = cache.resolve(kid("k1")).await;
    assert_eq!(source.fetches(), 3);
    Ok(())
}

#[tokio::test]
async fn rotated_key_is_found_by_forced_refresh() -> Result<()> {
    let old = TestSigner::es256("k0")?;
    let new = TestSigner::ed25519("k1")?;
    let source = Scripted::serving(jwks_of([&old]));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    cache.resolve(kid("k0")).await?;
    source.set(Ok(jwks_of([&old, &new])));

    let key = cache.resolve(kid("k1")).await?;
    assert_eq!(*key, new.signing_key());
    assert_eq!(source.fetches(), 2);
    Ok(())
}

#[tokio::test]
async fn unknown_kid_fails_immediately_when_forced_refresh_is_disabled() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, _) = cache_over(
        &source,
        CacheConfig::default().with_refresh_unknown_kid(false),
    );

    let err = cache.resolve(kid("k1")).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnknownKeyId(_)));
    assert_eq!(source.fetches(), 1);
    Ok(())
}

#[tokio::test]
async fn failed_refresh_keeps_previous_set_and_notifies_observer() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let failures = Arc::new(AtomicUsize::new(0));

    let observed = Arc::clone(&failures);
    let cache = KeySetCache::builder(Arc::clone(&source))
        .clock(TestClock::new(START))
        .on_refresh_error(move |err| {
            assert_eq!(err.status(), Some(503));
            observed.fetch_add(1, Ordering::SeqCst);
        })
        .build();

    let before = cache.resolve(kid("k0")).await?;
    source.set(Err(FetchError::Status { status: 503 }));

    let err = cache.refresh().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    assert_eq!(failures.load(Ordering::SeqCst), 1);

    let after = cache.resolve(kid("k0")).await?;
    assert!(Arc::ptr_eq(&before, &after));
    assert_eq!(cache.current().len(), 1);
    Ok(())
}

#[tokio::test]
async fn initial_failure_makes_the_source_unavailable() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::failing(FetchError::transport("connection refused"));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    let err = cache.resolve(kid("k0")).await.unwrap_err();
    assert!(matches!(err, ResolveError::Unavailable(_)));
    assert!(!cache.current().is_loaded());

    source.set(Ok(jwks_of([&signer])));
    cache.resolve(kid("k0")).await?;
    assert_eq!(source.fetches(), 2, "initial loads are not rate limited");
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_lookups_share_one_fetch() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::with_delay(Ok(jwks_of([&signer])), Duration::from_millis(50));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.resolve(kid("k0")).await })
        })
        .collect();

    let mut keys = Vec::with_capacity(tasks.len());
    for task in tasks {
        keys.push(task.await??);
    }

    assert_eq!(source.fetches(), 1);
    assert!(keys.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_unknown_kid_lookups_share_one_forced_refresh() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::with_delay(Ok(jwks_of([&signer])), Duration::from_millis(50));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    cache.resolve(kid("k0")).await?;
    assert_eq!(source.fetches(), 1);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let cache = cache.clone();
            tokio::spawn(async move { cache.resolve(kid("k9")).await })
        })
        .collect();

    for task in tasks {
        let err = task.await?.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownKeyId(_)));
    }

    assert_eq!(source.fetches(), 2, "initial load plus one forced refresh");
    Ok(())
}

#[tokio::test]
async fn stale_set_with_unknown_kid_fetches_once() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, clock) = cache_over(
        &source,
        CacheConfig::default().with_refresh_interval(Duration::from_secs(60)),
    );

    cache.resolve(kid("k0")).await?;
    clock.inc(61);

    let err = cache.resolve(kid("zz")).await.unwrap_err();
    assert!(matches!(err, ResolveError::UnknownKeyId(_)));

    // let the background refresh run to completion
    for _ in 0..10 {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(source.fetches(), 2);
    Ok(())
}

#[tokio::test]
async fn background_refresh_recovers_after_observer_panics() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let panicked = Arc::new(AtomicUsize::new(0));

    let observed = Arc::clone(&panicked);
    let clock = TestClock::new(START);
    let cache = KeySetCache::builder(Arc::clone(&source))
        .config(CacheConfig::default().with_refresh_interval(Duration::from_secs(60)))
        .clock(clock.clone())
        .on_refresh_error(move |_| {
            if observed.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("observer failure");
            }
        })
        .build();

    cache.resolve(kid("k0")).await?;
    source.set(Err(FetchError::Status { status: 500 }));

    clock.inc(61);
    cache.resolve(kid("k0")).await?;
    for _ in 0..100 {
        if panicked.load(Ordering::SeqCst) == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(source.fetches(), 2);

    clock.inc(61);
    cache.resolve(kid("k0")).await?;
    for _ in 0..100 {
        if source.fetches() == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(source.fetches(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn slow_source_times_out() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::with_delay(Ok(jwks_of([&signer])), Duration::from_secs(30));
    let (cache, _) = cache_over(
        &source,
        CacheConfig::default().with_fetch_timeout(Duration::from_millis(100)),
    );

    let err = cache.resolve(kid("k0")).await.unwrap_err();
    let unavailable = match err {
        ResolveError::Unavailable(e) => e,
        other => panic!("expected unavailable, got {other:?}"),
    };

    let cause = std::error::Error::source(&unavailable)
        .and_then(|e| e.downcast_ref::<FetchError>())
        .expect("fetch error cause");
    assert!(cause.is_timeout());
    Ok(())
}

#[tokio::test]
async fn stale_set_is_refreshed_in_background() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, clock) = cache_over(
        &source,
        CacheConfig::default().with_refresh_interval(Duration::from_secs(60)),
    );

    cache.resolve(kid("k0")).await?;
    let loaded_at = cache.current().fetched_at();

    clock.inc(61);
    cache.resolve(kid("k0")).await?;

    for _ in 0..100 {
        if cache.current().fetched_at() != loaded_at {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert_eq!(source.fetches(), 2);
    assert_eq!(cache.current().fetched_at(), Some(UnixTime(START.0 + 61)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn passive_refresh_runs_until_handle_is_dropped() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, _) = cache_over(
        &source,
        CacheConfig::default().with_refresh_interval(Duration::from_secs(60)),
    );

    let handle = cache.spawn_passive_refresh();

    tokio::time::sleep(Duration::from_secs(61)).await;
    assert_eq!(source.fetches(), 1);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(source.fetches(), 2);

    drop(handle);
    tokio::time::sleep(Duration::from_secs(180)).await;
    assert_eq!(source.fetches(), 2);
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn refreshes_are_logged() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    cache.refresh().await?;
    assert!(logs_contain("JWKS refreshed"));

    source.set(Err(FetchError::Status { status: 500 }));
    let _ = cache.refresh().await;
    assert!(logs_contain("JWKS refresh failed; keeping previous key set"));
    Ok(())
}

#[tokio::test]
async fn seeded_set_answers_without_fetching() -> Result<()> {
    let signer = TestSigner::ed25519("seed")?;
    let source = Scripted::failing(FetchError::Status { status: 500 });
    let (cache, _) = cache_over(&source, CacheConfig::default());

    cache.set_key_set(jwks_of([&signer]));

    let key = cache.resolve(kid("seed")).await?;
    assert_eq!(*key, signer.signing_key());
    assert_eq!(source.fetches(), 0);
    Ok(())
}

#[tokio::test]
async fn validates_tokens_through_the_cache() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let source = Scripted::serving(jwks_of([&signer]));
    let (cache, _) = cache_over(&source, CacheConfig::default());

    let token = signer.sign(&Claims::new().with_subject("alice"))?;
    let validated = CoreValidator::default().validate(&token, &cache).await?;

    assert_eq!(validated.claims().sub().map(|s| s.as_str()), Some("alice"));
    Ok(())
}
