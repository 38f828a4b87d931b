#![cfg(feature = "reqwest")]

use color_eyre::Result;
use keygate::{jwk::KeyIdRef, test_util::TestSigner};
use keygate_jwks::{FetchError, KeySetCache, KeySource, RemoteKeySource};
use serde_json::json;
use tracing_test::traced_test;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

const JWKS_PATH: &str = "/.well-known/jwks.json";

async fn source_for(server: &MockServer) -> Result<RemoteKeySource> {
    Ok(RemoteKeySource::new(format!("{}{JWKS_PATH}", server.uri()))?)
}

#[tokio::test]
async fn fetches_and_revalidates_with_etag() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .and(header("if-none-match", "\"v1\""))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .and(header(
            "user-agent",
            concat!("keygate_jwks/", env!("CARGO_PKG_VERSION")),
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("etag", "\"v1\"")
                .set_body_json(json!({ "keys": [signer.jwk_json()] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server).await?;

    let first = source.fetch().await?;
    let second = source.fetch().await?;

    assert_eq!(first.keys(), [signer.signing_key()]);
    assert_eq!(second, first);
    Ok(())
}

#[tokio::test]
async fn revalidates_with_last_modified_when_no_etag() -> Result<()> {
    let signer = TestSigner::ed25519("ed")?;
    let server = MockServer::start().await;
    let stamp = "Wed, 21 Oct 2015 07:28:00 GMT";

    Mock::given(method("GET"))
        .and(header("if-modified-since", stamp))
        .respond_with(ResponseTemplate::new(304))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("last-modified", stamp)
                .set_body_json(json!({ "keys": [signer.jwk_json()] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let source = source_for(&server).await?;
    source.fetch().await?;
    let jwks = source.fetch().await?;

    assert!(jwks.get_key_by_id(KeyIdRef::from_str("ed")).is_some());
    Ok(())
}

#[tokio::test]
async fn unexpected_status_is_reported() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = source_for(&server).await?.fetch().await.unwrap_err();
    assert_eq!(err.status(), Some(503));
    Ok(())
}

#[tokio::test]
#[traced_test]
async fn failed_refresh_is_warned_once() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let cache = KeySetCache::new(source_for(&server).await?);
    let err = cache.refresh().await.unwrap_err();
    assert_eq!(err.status(), Some(503));

    logs_assert(|lines: &[&str]| {
        match lines.iter().filter(|line| line.contains(" WARN ")).count() {
            1 => Ok(()),
            n => Err(format!("expected one warning, saw {n}")),
        }
    });
    Ok(())
}

#[tokio::test]
async fn not_modified_without_prior_document_is_an_error() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(304))
        .mount(&server)
        .await;

    let err = source_for(&server).await?.fetch().await.unwrap_err();
    assert_eq!(err.status(), Some(304));
    Ok(())
}

#[tokio::test]
async fn undecodable_document_is_reported() -> Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = source_for(&server).await?.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
    Ok(())
}

#[tokio::test]
async fn unreachable_source_is_a_transport_error() -> Result<()> {
    let source = RemoteKeySource::new(format!("http://127.0.0.1:1{JWKS_PATH}"))?;

    let err = source.fetch().await.unwrap_err();
    assert!(matches!(err, FetchError::Transport(_)));
    Ok(())
}

#[tokio::test]
async fn cache_loads_from_remote_source() -> Result<()> {
    let signer = TestSigner::es256("k0")?;
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "keys": [signer.jwk_json()] })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let cache = KeySetCache::new(source_for(&server).await?);
    let key = cache.resolve(KeyIdRef::from_str("k0")).await?;

    assert_eq!(*key, signer.signing_key());
    assert_eq!(cache.source().location(), format!("{}{JWKS_PATH}", server.uri()));
    Ok(())
}
