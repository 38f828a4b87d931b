use std::sync::Arc;

use async_trait::async_trait;
use keygate::Jwks;

use crate::FetchError;

/// A place from which a complete key set can be fetched
///
/// Each call returns the whole set as currently published. Sources do not
/// cache on behalf of the [`KeySetCache`][crate::KeySetCache], though they
/// may use conditional requests to avoid re-downloading unchanged documents.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Fetches the current key set
    async fn fetch(&self) -> Result<Jwks, FetchError>;

    /// A human-readable description of where keys come from, used in logs
    fn location(&self) -> &str {
        "<static>"
    }
}

#[async_trait]
impl<S: KeySource + ?Sized> KeySource for Arc<S> {
    async fn fetch(&self) -> Result<Jwks, FetchError> {
        S::fetch(self).await
    }

    fn location(&self) -> &str {
        S::location(self)
    }
}

#[async_trait]
impl<S: KeySource + ?Sized> KeySource for Box<S> {
    async fn fetch(&self) -> Result<Jwks, FetchError> {
        S::fetch(self).await
    }

    fn location(&self) -> &str {
        S::location(self)
    }
}

/// A key source that always serves the same key set
#[derive(Clone, Debug, Default)]
pub struct StaticKeySource {
    jwks: Jwks,
}

impl StaticKeySource {
    /// Serves `jwks` on every fetch
    #[must_use]
    pub fn new(jwks: Jwks) -> Self {
        Self { jwks }
    }

    /// The key set being served
    #[must_use]
    pub fn jwks(&self) -> &Jwks {
        &self.jwks
    }
}

impl From<Jwks> for StaticKeySource {
    fn from(jwks: Jwks) -> Self {
        Self::new(jwks)
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn fetch(&self) -> Result<Jwks, FetchError> {
        Ok(self.jwks.clone())
    }
}
