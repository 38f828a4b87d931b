use std::error::Error as StdError;

use keygate::error::{ClaimsRejected, JwtVerifyError, ResolveError};
use thiserror::Error;

/// Why a request was not authorized
///
/// Every variant means the request is denied. Only
/// [`MissingCredential`][Self::MissingCredential],
/// [`MalformedToken`][Self::MalformedToken] and
/// [`ExpiredToken`][Self::ExpiredToken] carry a denial message meant for
/// the client; the rest are failures the host reports generically.
#[derive(Debug, Error)]
pub enum AuthorizationError {
    /// No bearer credential was presented
    #[error("no bearer credential presented")]
    MissingCredential,

    /// The credential is not a well-formed token
    #[error("malformed token")]
    MalformedToken(#[source] JwtVerifyError),

    /// No key is known for the token's key ID
    #[error("no key known for token")]
    UnknownKey(#[source] JwtVerifyError),

    /// The signature does not verify under the named key and algorithm
    #[error("token signature is invalid")]
    SignatureInvalid(#[source] JwtVerifyError),

    /// The token is past its expiration time
    #[error("token is expired")]
    ExpiredToken(#[source] JwtVerifyError),

    /// The token is not yet valid
    #[error("token is not yet valid")]
    PrematureToken(#[source] JwtVerifyError),

    /// The token's claims do not satisfy the authorizer
    #[error("token claims rejected")]
    InvalidClaims(#[source] JwtVerifyError),

    /// The key source could not be reached and no keys were cached
    #[error("signing keys unavailable")]
    Fetch(#[source] JwtVerifyError),

    /// A failure unrelated to the presented token
    #[error("internal authorizer error")]
    Internal(#[source] Box<dyn StdError + Send + Sync + 'static>),
}

impl AuthorizationError {
    pub(crate) fn missing_subject() -> Self {
        Self::InvalidClaims(ClaimsRejected::MissingRequiredClaim("sub").into())
    }

    pub(crate) fn internal(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Internal(source.into())
    }

    /// Whether the credential was absent or unreadable
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingCredential | Self::MalformedToken(_))
    }

    /// The message to hand back to the client, if this failure has one
    ///
    /// Gateways map the exact message `Unauthorized` to a 401 response.
    /// Failures without a denial message should be reported as generic
    /// errors.
    #[must_use]
    pub fn denial_message(&self) -> Option<&'static str> {
        match self {
            Self::MissingCredential | Self::MalformedToken(_) => Some("Unauthorized"),
            Self::ExpiredToken(_) => Some("token is expired"),
            _ => None,
        }
    }
}

impl From<JwtVerifyError> for AuthorizationError {
    fn from(err: JwtVerifyError) -> Self {
        match &err {
            JwtVerifyError::MalformedToken(_)
            | JwtVerifyError::MalformedTokenHeader(_)
            | JwtVerifyError::MalformedTokenPayload(_)
            | JwtVerifyError::MalformedTokenSignature(_) => Self::MalformedToken(err),
            JwtVerifyError::KeyResolution(ResolveError::UnknownKeyId(_)) => Self::UnknownKey(err),
            JwtVerifyError::KeyResolution(ResolveError::Unavailable(_)) => Self::Fetch(err),
            JwtVerifyError::JwkVerifyError(_) => Self::SignatureInvalid(err),
            JwtVerifyError::ClaimsRejected(ClaimsRejected::TokenExpired) => Self::ExpiredToken(err),
            JwtVerifyError::ClaimsRejected(
                ClaimsRejected::TokenNotYetValid | ClaimsRejected::TokenIssuedInFuture,
            ) => Self::PrematureToken(err),
            JwtVerifyError::ClaimsRejected(_) => Self::InvalidClaims(err),
        }
    }
}
