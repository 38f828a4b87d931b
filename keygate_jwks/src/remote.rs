use std::sync::Arc;

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use keygate::Jwks;
use reqwest::{
    header::{self, HeaderValue},
    Client, StatusCode,
};

use crate::{FetchError, KeySource};

const USER_AGENT: &str = concat!("keygate_jwks/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
struct Validators {
    jwks: Jwks,
    etag: Option<HeaderValue>,
    last_modified: Option<HeaderValue>,
}

/// A key source backed by a JWKS document published over HTTP(S)
///
/// The `ETag` and `Last-Modified` of the last good response are replayed
/// as `If-None-Match` and `If-Modified-Since`. When the server answers
/// `304 Not Modified`, the previously downloaded document is returned.
#[derive(Debug)]
pub struct RemoteKeySource {
    url: String,
    client: Client,
    last: ArcSwapOption<Validators>,
}

impl RemoteKeySource {
    /// Constructs a source for the JWKS document at `url`
    ///
    /// # Errors
    ///
    /// The HTTP client could not be initialized.
    pub fn new(url: impl Into<String>) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::transport)?;

        Ok(Self::with_client(url, client))
    }

    /// Constructs a source using a preconfigured HTTP client
    pub fn with_client(url: impl Into<String>, client: Client) -> Self {
        Self {
            url: url.into(),
            client,
            last: ArcSwapOption::empty(),
        }
    }

    /// The URL of the JWKS document
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySource for RemoteKeySource {
    #[tracing::instrument(skip(self), fields(jwks.url = %self.url))]
    async fn fetch(&self) -> Result<Jwks, FetchError> {
        let previous = self.last.load_full();
        let mut request = self.client.get(&self.url);

        if let Some(prev) = &previous {
            if let Some(etag) = &prev.etag {
                request = request.header(header::IF_NONE_MATCH, etag);
            } else if let Some(last_modified) = &prev.last_modified {
                request = request.header(header::IF_MODIFIED_SINCE, last_modified);
            }
        }

        let response = request.send().await.map_err(FetchError::transport)?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return match previous {
                Some(prev) => {
                    tracing::debug!("JWKS not modified");
                    Ok(prev.jwks.clone())
                }
                None => {
                    tracing::debug!(
                        http.status_code = status.as_u16(),
                        "JWKS fetch failed; not modified without a prior document",
                    );
                    Err(FetchError::Status {
                        status: status.as_u16(),
                    })
                }
            };
        }

        if !status.is_success() {
            tracing::debug!(
                http.status_code = status.as_u16(),
                "JWKS fetch failed; unexpected response status",
            );
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let etag = response.headers().get(header::ETAG).map(ToOwned::to_owned);
        let last_modified = response
            .headers()
            .get(header::LAST_MODIFIED)
            .map(ToOwned::to_owned);

        let body = response.bytes().await.map_err(FetchError::transport)?;
        let jwks: Jwks = serde_json::from_slice(&body).map_err(|err| {
            let error: &dyn std::error::Error = &err;
            tracing::debug!(error, "JWKS fetch failed; unable to decode document");
            FetchError::decode(err)
        })?;

        self.last.store(Some(Arc::new(Validators {
            jwks: jwks.clone(),
            etag,
            last_modified,
        })));

        Ok(jwks)
    }

    fn location(&self) -> &str {
        &self.url
    }
}
