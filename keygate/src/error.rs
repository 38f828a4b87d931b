//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

use crate::jwk::KeyId;

/// The key's type, curve or declared `alg` rules out the token's algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key cannot verify {alg} signatures")]
pub struct IncompatibleAlgorithm {
    alg: crate::jwa::Algorithm,
}

#[inline]
pub(crate) fn incompatible_algorithm(alg: crate::jwa::Algorithm) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg }
}

/// The token names an algorithm this crate does not verify
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported algorithm '{alg}'")]
pub struct UnknownAlgorithm {
    alg: String,
}

#[inline]
pub(crate) fn unknown_algorithm(alg: impl Into<String>) -> UnknownAlgorithm {
    UnknownAlgorithm { alg: alg.into() }
}

/// The key is published for a use other than signing
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key is not published for signing")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// The token is not three dot-separated segments
#[derive(Clone, Copy, Debug, Error)]
#[error("malformed JWT")]
pub struct MalformedJwt {
    _p: (),
}

pub(crate) fn malformed_jwt() -> MalformedJwt {
    MalformedJwt { _p: () }
}

/// The first segment is not a base64url JSON object
#[derive(Debug, Error)]
#[error("malformed JWT header")]
pub struct MalformedJwtHeader {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtHeader {
    MalformedJwtHeader {
        source: source.into(),
    }
}

/// The second segment is not a base64url JSON object
#[derive(Debug, Error)]
#[error("malformed JWT payload")]
pub struct MalformedJwtPayload {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_payload(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtPayload {
    MalformedJwtPayload {
        source: source.into(),
    }
}

/// The third segment is not valid base64url
#[derive(Debug, Error)]
#[error("malformed JWT signature")]
pub struct MalformedJwtSignature {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_signature(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtSignature {
    MalformedJwtSignature {
        source: source.into(),
    }
}

/// The signature does not verify under the key
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature does not verify")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The key was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// No key with a matching identifier is known
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no key found for kid {}", .kid.as_deref().map_or("(none)", |k| k.as_str()))]
pub struct UnknownKeyId {
    kid: Option<KeyId>,
}

impl UnknownKeyId {
    /// The key identifier that could not be resolved, if the token named one
    #[must_use]
    pub fn kid(&self) -> Option<&crate::jwk::KeyIdRef> {
        self.kid.as_deref()
    }
}

/// Constructs an error for a key identifier that could not be resolved
pub fn unknown_key_id(kid: Option<KeyId>) -> UnknownKeyId {
    UnknownKeyId { kid }
}

/// The key source could not be reached and no cached key could stand in
#[derive(Debug, Error)]
#[error("key source unavailable")]
pub struct KeySourceUnavailable {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

/// Constructs an error for a key source that could not produce any keys
pub fn key_source_unavailable(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeySourceUnavailable {
    KeySourceUnavailable {
        source: source.into(),
    }
}

/// An error returned by a [`KeyResolver`][crate::KeyResolver]
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No key is known under the requested identifier
    #[error(transparent)]
    UnknownKeyId(#[from] UnknownKeyId),

    /// The key source failed before any key set could be loaded
    #[error(transparent)]
    Unavailable(#[from] KeySourceUnavailable),
}

/// Why a key refused a signature
#[derive(Debug, Error)]
pub enum JwkVerifyError {
    /// The token names an algorithm that is not supported
    #[error(transparent)]
    UnknownAlgorithm(#[from] UnknownAlgorithm),

    /// The key cannot check this algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// The key is not a signing key
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// Signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl JwkVerifyError {
    /// Whether the key could not check the token's algorithm
    #[must_use]
    pub fn is_incompatible_alg(&self) -> bool {
        matches!(self, Self::IncompatibleAlgorithm(_))
    }

    /// Whether the key is published for another use
    #[must_use]
    pub fn is_usage_mismatch(&self) -> bool {
        matches!(self, Self::JwkUsageMismatch(_))
    }

    /// Whether the signature itself was wrong
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_))
    }
}

/// Why a token failed validation
#[derive(Debug, Error)]
pub enum JwtVerifyError {
    /// The token does not split into three segments
    #[error(transparent)]
    MalformedToken(#[from] MalformedJwt),

    /// The header segment could not be decoded
    #[error(transparent)]
    MalformedTokenHeader(#[from] MalformedJwtHeader),

    /// The payload segment could not be decoded
    #[error(transparent)]
    MalformedTokenPayload(#[from] MalformedJwtPayload),

    /// The signature segment could not be decoded
    #[error(transparent)]
    MalformedTokenSignature(#[from] MalformedJwtSignature),

    /// The key named by the JWT could not be obtained
    #[error("unable to resolve signing key")]
    KeyResolution(#[from] ResolveError),

    /// The resolved key refused the signature
    #[error("token rejected by JWK")]
    JwkVerifyError(#[from] JwkVerifyError),

    /// A claim failed the validator's checks
    #[error("token rejected by claims validator")]
    ClaimsRejected(#[from] ClaimsRejected),
}

impl From<UnknownKeyId> for JwtVerifyError {
    fn from(err: UnknownKeyId) -> Self {
        Self::KeyResolution(err.into())
    }
}

impl JwtVerifyError {
    /// Whether the token could not be parsed at all
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::MalformedTokenHeader(_)
                | Self::MalformedTokenPayload(_)
                | Self::MalformedTokenSignature(_)
        )
    }

    /// Whether the token's `exp` claim has passed
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::ClaimsRejected(ClaimsRejected::TokenExpired))
    }

    /// Whether the token's `nbf` or `iat` claims lie in the future
    #[must_use]
    pub fn is_premature(&self) -> bool {
        matches!(
            self,
            Self::ClaimsRejected(
                ClaimsRejected::TokenNotYetValid | ClaimsRejected::TokenIssuedInFuture
            )
        )
    }

    /// Whether no key matched the token's `kid`
    #[must_use]
    pub fn is_unknown_key(&self) -> bool {
        matches!(self, Self::KeyResolution(ResolveError::UnknownKeyId(_)))
    }

    /// Whether the key source was unreachable with nothing cached
    #[must_use]
    pub fn is_key_source_unavailable(&self) -> bool {
        matches!(self, Self::KeyResolution(ResolveError::Unavailable(_)))
    }

    /// Whether the signature could not be verified with the resolved key
    #[must_use]
    pub fn is_signature_invalid(&self) -> bool {
        matches!(self, Self::JwkVerifyError(_))
    }
}

/// A claim that failed validation
#[derive(Debug, Error)]
pub enum ClaimsRejected {
    /// The algorithm is not on the approved list
    #[error("invalid algorithm")]
    InvalidAlgorithm,

    /// No audience matches the allowed audiences
    #[error("invalid audience")]
    InvalidAudience,

    /// The issuer is not the required one
    #[error("invalid issuer")]
    InvalidIssuer,

    /// `exp` has passed
    #[error("token expired")]
    TokenExpired,

    /// `nbf` has not yet arrived
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// The token claims to have been issued in the future according to the `iat` claim
    #[error("token used before issued")]
    TokenIssuedInFuture,

    /// A claim the validator requires is absent
    #[error("missing required claim `{_0}`")]
    MissingRequiredClaim(&'static str),
}
