use std::time::Duration;

use keygate::{
    jwa,
    jwt::{Audience, CoreValidator, Issuer},
};
use keygate_jwks::CacheConfig;
use serde::{Deserialize, Serialize};

/// Settings for an [`Authorizer`][crate::Authorizer]
///
/// Durations are whole seconds so the configuration can be loaded from
/// JSON or an environment-derived map.
///
/// ```
/// use keygate_authorizer::AuthorizerConfig;
///
/// let config: AuthorizerConfig = serde_json::from_str(r#"{
///     "jwks_url": "https://issuer.example/.well-known/jwks.json",
///     "refresh_rate_limit_secs": 60
/// }"#).unwrap();
///
/// assert_eq!(config.refresh_interval_secs, 3600);
/// assert_eq!(config.refresh_rate_limit_secs, 60);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizerConfig {
    /// Where the JSON Web Key Set is published
    pub jwks_url: String,

    /// Seconds between passive refreshes
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    /// Minimum seconds between refreshes forced by an unknown key ID
    #[serde(default = "default_refresh_rate_limit_secs")]
    pub refresh_rate_limit_secs: u64,

    /// Seconds a single fetch may take
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Whether an unknown key ID forces a refresh
    #[serde(default = "default_refresh_unknown_kid")]
    pub refresh_unknown_kid: bool,

    /// Seconds of clock skew tolerated on time-based claims
    #[serde(default)]
    pub leeway_secs: u64,

    /// Rejects tokens without an `exp` claim
    #[serde(default)]
    pub require_expiration: bool,

    /// The issuer tokens must name, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Issuer>,

    /// Audiences of which tokens must name at least one; empty accepts any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audiences: Vec<Audience>,

    /// Signing algorithms accepted; empty accepts every supported one
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub algorithms: Vec<jwa::Algorithm>,
}

fn default_refresh_interval_secs() -> u64 {
    60 * 60
}

fn default_refresh_rate_limit_secs() -> u64 {
    5 * 60
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_refresh_unknown_kid() -> bool {
    true
}

impl AuthorizerConfig {
    /// Default settings for keys published at `jwks_url`
    #[must_use]
    pub fn new(jwks_url: impl Into<String>) -> Self {
        Self {
            jwks_url: jwks_url.into(),
            refresh_interval_secs: default_refresh_interval_secs(),
            refresh_rate_limit_secs: default_refresh_rate_limit_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            refresh_unknown_kid: default_refresh_unknown_kid(),
            leeway_secs: 0,
            require_expiration: false,
            issuer: None,
            audiences: Vec::new(),
            algorithms: Vec::new(),
        }
    }

    /// Sets the passive refresh interval
    #[must_use]
    pub fn with_refresh_interval(self, interval: Duration) -> Self {
        Self {
            refresh_interval_secs: interval.as_secs(),
            ..self
        }
    }

    /// Sets the minimum spacing between forced refreshes
    #[must_use]
    pub fn with_refresh_rate_limit(self, rate_limit: Duration) -> Self {
        Self {
            refresh_rate_limit_secs: rate_limit.as_secs(),
            ..self
        }
    }

    /// Sets the fetch timeout
    #[must_use]
    pub fn with_fetch_timeout(self, timeout: Duration) -> Self {
        Self {
            fetch_timeout_secs: timeout.as_secs(),
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

    /// Sets the tolerated clock skew
    #[must_use]
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self {
            leeway_secs: leeway.as_secs(),
            ..self
        }
    }

    /// Rejects tokens without an `exp` claim
    #[must_use]
    pub fn require_expiration(self) -> Self {
        Self {
            require_expiration: true,
            ..self
        }
    }

    /// Requires tokens to name `issuer`
    #[must_use]
    pub fn with_issuer(self, issuer: impl Into<Issuer>) -> Self {
        Self {
            issuer: Some(issuer.into()),
            ..self
        }
    }

    /// Adds an accepted audience
    #[must_use]
    pub fn add_audience(mut self, audience: impl Into<Audience>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    /// Adds an accepted signing algorithm
    #[must_use]
    pub fn add_algorithm(mut self, alg: jwa::Algorithm) -> Self {
        self.algorithms.push(alg);
        self
    }

    /// The key set cache settings
    #[must_use]
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::default()
            .with_refresh_interval(Duration::from_secs(self.refresh_interval_secs))
            .with_refresh_rate_limit(Duration::from_secs(self.refresh_rate_limit_secs))
            .with_fetch_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .with_refresh_unknown_kid(self.refresh_unknown_kid)
    }

    /// A validator enforcing these settings
    pub fn validator(&self) -> CoreValidator {
        let validator = CoreValidator::default()
            .with_leeway_secs(self.leeway_secs)
            .extend_allowed_audiences(self.audiences.iter().cloned())
            .extend_approved_algorithms(self.algorithms.iter().copied());

        let validator = match &self.issuer {
            Some(issuer) => validator.require_issuer(issuer.clone()),
            None => validator,
        };

        if self.require_expiration {
            validator.require_expiration()
        } else {
            validator
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AuthorizerConfig::new("https://issuer.example/jwks.json");
        assert_eq!(config.cache_config(), CacheConfig::default());
        assert_eq!(config.leeway_secs, 0);
        assert!(!config.require_expiration);
    }

    #[test]
    fn deserializes_full_configuration() -> Result<()> {
        let config: AuthorizerConfig = serde_json::from_str(
            r#"{
                "jwks_url": "https://issuer.example/jwks.json",
                "refresh_interval_secs": 600,
                "refresh_rate_limit_secs": 30,
                "fetch_timeout_secs": 2,
                "refresh_unknown_kid": false,
                "leeway_secs": 5,
                "require_expiration": true,
                "issuer": "https://issuer.example/",
                "audiences": ["api://pets"],
                "algorithms": ["RS256", "ES256"]
            }"#,
        )?;

        let expected = AuthorizerConfig::new("https://issuer.example/jwks.json")
            .with_refresh_interval(Duration::from_secs(600))
            .with_refresh_rate_limit(Duration::from_secs(30))
            .with_fetch_timeout(Duration::from_secs(2))
            .with_refresh_unknown_kid(false)
            .with_leeway(Duration::from_secs(5))
            .require_expiration()
            .with_issuer("https://issuer.example/")
            .add_audience("api://pets")
            .add_algorithm(jwa::Algorithm::RS256)
            .add_algorithm(jwa::Algorithm::ES256);

        assert_eq!(config, expected);
        assert!(!config.cache_config().refresh_unknown_kid);
        Ok(())
    }

    #[test]
    fn url_is_required() {
        assert!(serde_json::from_str::<AuthorizerConfig>("{}").is_err());
    }
}
