use keygate::{jwt::CoreValidator, KeyResolver};
use keygate_clock::{Clock, System};

use crate::{extract_bearer, AuthorizationError, Decision};

/// Decides whether a request bearing a token may access a resource
///
/// The authorizer holds no per-request state. Share one instance (and
/// its key resolver) across all requests.
#[derive(Clone, Debug)]
#[must_use]
pub struct Authorizer<R, C = System> {
    validator: CoreValidator<C>,
    resolver: R,
}

impl<R: KeyResolver> Authorizer<R> {
    /// Constructs an authorizer validating tokens with `validator` against
    /// keys from `resolver`
    pub fn new(validator: CoreValidator, resolver: R) -> Self {
        Self {
            validator,
            resolver,
        }
    }
}

#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
impl Authorizer<keygate_jwks::KeySetCache<keygate_jwks::RemoteKeySource>> {
    /// Constructs an authorizer over a key set cache for the configured URL
    ///
    /// Keys are loaded on the first request. Call
    /// [`spawn_passive_refresh`][keygate_jwks::KeySetCache::spawn_passive_refresh]
    /// on [`resolver`][Self::resolver] to keep them fresh without traffic.
    ///
    /// # Errors
    ///
    /// The HTTP client could not be initialized.
    pub fn from_config(
        config: &crate::AuthorizerConfig,
    ) -> Result<Self, keygate_jwks::FetchError> {
        let source = keygate_jwks::RemoteKeySource::new(config.jwks_url.clone())?;
        let cache = keygate_jwks::KeySetCache::builder(source)
            .config(config.cache_config())
            .build();

        Ok(Self::new(config.validator(), cache))
    }
}

impl<R, C> Authorizer<R, C> {
    /// Replaces the clock used to judge time-based claims
    pub fn with_clock<D: Clock>(self, clock: D) -> Authorizer<R, D> {
        Authorizer {
            validator: self.validator.with_clock(clock),
            resolver: self.resolver,
        }
    }

    /// The key resolver
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The token validator
    pub fn validator(&self) -> &CoreValidator<C> {
        &self.validator
    }
}

impl<R: KeyResolver, C: Clock> Authorizer<R, C> {
    /// Authorizes a request carrying the `Authorization` header value
    /// `authorization` against `resource_arn`
    ///
    /// Only an allow decision is ever returned. Every failure is an error,
    /// which the gateway treats as a denial.
    ///
    /// # Errors
    ///
    /// The credential is missing or fails validation, or the validated
    /// token names no subject.
    #[tracing::instrument(skip(self, authorization))]
    pub async fn authorize(
        &self,
        authorization: Option<&str>,
        resource_arn: &str,
    ) -> Result<Decision, AuthorizationError> {
        let Some(token) = extract_bearer(authorization) else {
            tracing::debug!("denied: no bearer credential");
            return Err(AuthorizationError::MissingCredential);
        };

        let validated = match self.validator.validate(token, &self.resolver).await {
            Ok(validated) => validated,
            Err(err) => {
                let err = AuthorizationError::from(err);
                let error: &dyn std::error::Error = &err;
                tracing::debug!(error, token = ?token, "denied");
                return Err(err);
            }
        };

        let claims = validated.into_claims();
        let Some(subject) = claims.sub().filter(|s| !s.as_str().is_empty()) else {
            tracing::debug!("denied: token names no subject");
            return Err(AuthorizationError::missing_subject());
        };

        tracing::info!(user.entity = %subject, "allowed");
        Ok(Decision::allow(subject, resource_arn))
    }

    /// Authorizes a request and renders the gateway's policy document
    ///
    /// # Errors
    ///
    /// As for [`authorize`][Self::authorize], plus a failure to render the
    /// document.
    pub async fn respond(
        &self,
        authorization: Option<&str>,
        resource_arn: &str,
    ) -> Result<serde_json::Value, AuthorizationError> {
        let decision = self.authorize(authorization, resource_arn).await?;
        serde_json::to_value(decision.to_response()).map_err(AuthorizationError::internal)
    }
}
