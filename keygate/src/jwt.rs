//! Implementations of the JSON Web Tokens (JWT) standard
//!
//! The specifications for this standard can be found in [RFC7519][].
//!
//! Signed JWTs appear as a three-part base64url-encoded string, where each
//! part is separated by a `.`.
//!
//! ```text
//! eyJhbGciOiJFUzI1NiIsImtpZCI6ImsxIn0.eyJzdWIiOiJhbGljZSJ9.<signature>
//! ```
//!
//! The first section is the header in JSON format. It names the signing
//! algorithm and the identifier (`kid`) of the key that produced the
//! signature. Because an adversary controls it, the header is only used to
//! elect a key from a trusted set, never to supply one.
//!
//! The second section is the payload in JSON format, and contains claims
//! regarding the authentication: how long the token is valid, who issued
//! it, who it is intended for, and the subject it authenticates. Nothing in
//! this section should be trusted before the signature has been verified.
//! The time-based claims are the one exception to that ordering: a token
//! that has already expired is rejected before any key is looked up, since
//! no signature can make it acceptable again.
//!
//! The third section is the binary signature, which is verified against a
//! [`SigningKey`] obtained from a [`KeyResolver`].
//!
//! [RFC7519]: https://tools.ietf.org/html/rfc7519

use std::{error::Error as StdError, fmt, sync::Arc, time::Duration};

use aliri_base64::{Base64Url, Base64UrlRef};
use aliri_braid::braid;
use async_trait::async_trait;
use keygate_clock::{Clock, DurationSecs, System, UnixTime};
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{error, jwa, jwk, jws::Verifier, SigningKey};

/// An audience
#[braid(serde, ref_doc = "A borrowed reference to an [`Audience`]")]
pub struct Audience;

/// An issuer of JWTs
#[braid(serde, ref_doc = "A borrowed reference to an [`Issuer`]")]
pub struct Issuer;

/// The subject of a JWT
#[braid(serde, ref_doc = "A borrowed reference to a [`Subject`]")]
pub struct Subject;

/// A JSON Web Token
///
/// This type provides custom implementations of [`Display`][JwtRef#impl-Display] and
/// [`Debug`][JwtRef#impl-Debug] to prevent unintentional disclosures of the credential.
/// See the documentation on those trait implementations on the [`JwtRef`] type for more
/// information.
#[braid(
    serde,
    debug = "owned",
    display = "owned",
    ord = "omit",
    ref_doc = "\
    A borrowed reference to a JSON Web Token ([`Jwt`])\n\
    \n\
    This type provides custom implementations of [`Display`][Self#impl-Display] and \
    [`Debug`][Self#impl-Debug] to prevent unintentional disclosures of the credential. \
    See the documentation on those trait implementations for more information.
    "
)]
#[must_use]
pub struct Jwt;

/// Prints a placeholder unless the alternate form (`{:#?}`) is requested
///
/// The alternate form prints the header and payload but omits the
/// signature. A width (`{:#8?}`) reveals up to that many characters of the
/// signature.
///
/// ```
/// # use keygate::jwt::JwtRef;
/// let token = JwtRef::from_str("eyJhbGciOiJFZERTQSJ9.e30.c2lnbmF0dXJl");
///
/// assert_eq!(format!("{:?}", token), "***JWT***");
/// assert_eq!(format!("{:#?}", token), "\"eyJhbGciOiJFZERTQSJ9.e30.…\"");
/// assert_eq!(format!("{:#4?}", token), "\"eyJhbGciOiJFZERTQSJ9.e30.c2l…\"");
/// ```
impl fmt::Debug for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            f.write_str("\"")?;
            reveal_unsigned(&self.0, f, 0)?;
            f.write_str("\"")
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

/// Prints a placeholder unless the alternate form (`{:#}`) is requested
///
/// The alternate form prints the whole token, or with a width (`{:#8}`)
/// only that many characters of the signature.
///
/// ```
/// # use keygate::jwt::JwtRef;
/// let token = JwtRef::from_str("eyJhbGciOiJFZERTQSJ9.e30.c2lnbmF0dXJl");
///
/// assert_eq!(format!("{}", token), "***JWT***");
/// assert_eq!(format!("{:#}", token), "eyJhbGciOiJFZERTQSJ9.e30.c2lnbmF0dXJl");
/// assert_eq!(format!("{:#4}", token), "eyJhbGciOiJFZERTQSJ9.e30.c2l…");
/// ```
impl fmt::Display for JwtRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if f.alternate() {
            reveal_unsigned(&self.0, f, usize::MAX)
        } else {
            f.write_str(concat!("***", "JWT", "***"))
        }
    }
}

fn reveal_unsigned(token: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    match token.rfind('.') {
        Some(last_period) => {
            f.write_str(&token[..=last_period])?;
            limited_reveal(&token[last_period + 1..], f, default_len)
        }
        None => limited_reveal(token, f, default_len),
    }
}

fn limited_reveal(unprotected: &str, f: &mut fmt::Formatter, default_len: usize) -> fmt::Result {
    let max_len = f.width().unwrap_or(default_len);
    if max_len <= 1 {
        f.write_str("…")
    } else if max_len > unprotected.len() {
        f.write_str(unprotected)
    } else {
        match unprotected.char_indices().nth(max_len - 2) {
            Some((idx, c)) if idx + c.len_utf8() < unprotected.len() => {
                f.write_str(&unprotected[0..idx + c.len_utf8()])?;
                f.write_str("…")
            }
            _ => f.write_str(unprotected),
        }
    }
}

/// A set of zero or more [`Audience`]s
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OneOrMany<Audience>", into = "OneOrMany<Audience>")]
#[repr(transparent)]
#[must_use]
pub struct Audiences(Vec<Audience>);

impl Audiences {
    /// An empty audience set
    #[inline]
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// An audience set with a single audience
    #[inline]
    pub fn single(aud: impl Into<Audience>) -> Self {
        Self(vec![aud.into()])
    }

    /// Indicates whether the audience set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates through references to the audiences in the set
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &AudienceRef> {
        self.0.iter().map(AsRef::as_ref)
    }
}

impl From<OneOrMany<Audience>> for Audiences {
    #[inline]
    fn from(vals: OneOrMany<Audience>) -> Self {
        match vals {
            OneOrMany::One(x) => Self(vec![x]),
            OneOrMany::Many(v) => Self(v),
        }
    }
}

impl From<Audiences> for OneOrMany<Audience> {
    #[inline]
    fn from(mut vals: Audiences) -> Self {
        match vals.0.len() {
            1 => vals.0.pop().map_or_else(|| Self::Many(Vec::new()), Self::One),
            _ => Self::Many(vals.0),
        }
    }
}

impl From<Vec<Audience>> for Audiences {
    #[inline]
    fn from(vals: Vec<Audience>) -> Self {
        Self(vals)
    }
}

impl From<Audience> for Audiences {
    #[inline]
    fn from(aud: Audience) -> Self {
        Self::single(aud)
    }
}

/// A type representing one or more items, primarily for serialization
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single item
    One(T),

    /// Zero or more items, to be serialized/deserialized as an array
    Many(Vec<T>),
}

/// The JOSE header of a JWT
///
/// The algorithm is kept as the raw name found in the token, so that an
/// unsupported algorithm is reported as a verification failure rather than
/// a malformed token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Headers {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    kid: Option<jwk::KeyId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl Headers {
    /// Constructs JWT headers with a specific signing algorithm and key ID
    pub fn new(alg: jwa::Algorithm, kid: impl Into<jwk::KeyId>) -> Self {
        Self {
            alg: alg.as_str().to_owned(),
            kid: Some(kid.into()),
            typ: Some("JWT".to_owned()),
        }
    }

    /// The algorithm name exactly as it appears in the token
    #[must_use]
    pub fn alg_name(&self) -> &str {
        &self.alg
    }

    /// The signing algorithm named by the token
    ///
    /// # Errors
    ///
    /// The algorithm is not one of the supported asymmetric algorithms.
    pub fn alg(&self) -> Result<jwa::Algorithm, error::UnknownAlgorithm> {
        jwa::Algorithm::try_from(self.alg.as_str())
    }

    /// The ID of the key that signed the token
    #[must_use]
    pub fn kid(&self) -> Option<&jwk::KeyIdRef> {
        self.kid.as_deref()
    }

    /// The declared media type of the token
    #[must_use]
    pub fn typ(&self) -> Option<&str> {
        self.typ.as_deref()
    }
}

/// The claim set carried in a JWT payload
///
/// The registered claims are exposed as typed accessors. Every other
/// claim is retained as raw JSON in [`extra()`][Claims::extra].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[must_use]
pub struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<Subject>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<Issuer>,
    #[serde(default, skip_serializing_if = "Audiences::is_empty")]
    aud: Audiences,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    exp: Option<UnixTime>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    nbf: Option<UnixTime>,
    #[serde(
        default,
        deserialize_with = "numeric_date",
        skip_serializing_if = "Option::is_none"
    )]
    iat: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    jti: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl Claims {
    /// Constructs a new, empty claim set
    pub fn new() -> Self {
        Self::default()
    }

    /// Subject
    #[must_use]
    pub fn sub(&self) -> Option<&SubjectRef> {
        self.sub.as_deref()
    }

    /// Issuer
    #[must_use]
    pub fn iss(&self) -> Option<&IssuerRef> {
        self.iss.as_deref()
    }

    /// Audience
    pub fn aud(&self) -> &Audiences {
        &self.aud
    }

    /// Expires
    #[must_use]
    pub fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    /// Not before
    #[must_use]
    pub fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    /// Issued at
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    /// JWT ID
    #[must_use]
    pub fn jti(&self) -> Option<&str> {
        self.jti.as_deref()
    }

    /// All claims not covered by a typed accessor
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Looks up an unregistered claim by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }

    /// Sets the `sub` claim
    pub fn with_subject(mut self, sub: impl Into<Subject>) -> Self {
        self.sub = Some(sub.into());
        self
    }

    /// Sets the `iss` claim
    pub fn with_issuer(mut self, iss: impl Into<Issuer>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    /// Sets the `aud` claim to a single audience
    pub fn with_audience(mut self, aud: impl Into<Audience>) -> Self {
        self.aud = Audiences::single(aud);
        self
    }

    /// Sets the `aud` claim, where multiple audiences are allowed
    pub fn with_audiences(mut self, aud: impl Into<Audiences>) -> Self {
        self.aud = aud.into();
        self
    }

    /// Sets the `exp` claim
    pub fn with_expiration(mut self, time: UnixTime) -> Self {
        self.exp = Some(time);
        self
    }

    /// Sets the `exp` claim relative to the given clock
    pub fn with_future_expiration_from_clock<C: Clock>(self, secs: u64, clock: &C) -> Self {
        let exp = clock.now() + DurationSecs(secs);
        self.with_expiration(exp)
    }

    /// Sets the `nbf` claim
    pub fn with_not_before(mut self, time: UnixTime) -> Self {
        self.nbf = Some(time);
        self
    }

    /// Sets the `iat` claim
    pub fn with_issued_at(mut self, time: UnixTime) -> Self {
        self.iat = Some(time);
        self
    }

    /// Sets the `jti` claim
    pub fn with_jwt_id(mut self, jti: impl Into<String>) -> Self {
        self.jti = Some(jti.into());
        self
    }

    /// Adds an unregistered claim
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }
}

/// Accepts NumericDate values written as integers or as fractional seconds
fn numeric_date<'de, D>(deserializer: D) -> Result<Option<UnixTime>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumericDate {
        Whole(u64),
        Fractional(f64),
    }

    let date = Option::<NumericDate>::deserialize(deserializer)?;
    Ok(date.map(|d| match d {
        NumericDate::Whole(secs) => UnixTime(secs),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        NumericDate::Fractional(secs) if secs.is_finite() && secs > 0.0 => UnixTime(secs as u64),
        NumericDate::Fractional(_) => UnixTime(0),
    }))
}

/// The validated headers and claims of a JWT
///
/// This type can _only_ be generated within this crate to assert that the
/// headers and claims held by this type have already been validated.
#[derive(Clone, Debug, PartialEq)]
pub struct Validated {
    headers: Headers,
    claims: Claims,
}

impl Validated {
    /// Extracts the header and claims from the token
    pub fn extract(self) -> (Headers, Claims) {
        (self.headers, self.claims)
    }

    /// Takes ownership of the validated claims
    pub fn into_claims(self) -> Claims {
        self.claims
    }

    /// The validated token headers
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The validated token claims
    pub fn claims(&self) -> &Claims {
        &self.claims
    }
}

/// A decomposed JWT
///
/// Header and payload are decoded but nothing has been verified yet.
#[derive(Clone, Debug, PartialEq)]
#[must_use]
pub struct Decomposed<'a> {
    header: Headers,
    message: &'a str,
    claims: Claims,
    signature: Base64Url,
}

impl<'a> Decomposed<'a> {
    /// The untrusted headers of the JWT
    ///
    /// **WARNING:** *These headers have not been validated and should not be trusted.*
    pub fn untrusted_header(&self) -> &Headers {
        &self.header
    }

    /// The untrusted claims of the JWT
    ///
    /// **WARNING:** *These claims have not been validated and should not be trusted.*
    pub fn untrusted_claims(&self) -> &Claims {
        &self.claims
    }

    /// The signed portion of the JWT: the encoded header and payload, separated by a `.`
    #[must_use]
    pub fn untrusted_message(&self) -> &'a str {
        self.message
    }

    /// The raw signature of the JWT
    pub fn signature(&self) -> &Base64UrlRef {
        &self.signature
    }
}

macro_rules! expect_two {
    ($iter:expr) => {{
        let mut i = $iter;
        match (i.next(), i.next(), i.next()) {
            (Some(first), Some(second), None) => Some((first, second)),
            _ => None,
        }
    }};
}

fn decode_object<T: DeserializeOwned>(
    segment: &str,
) -> Result<T, Box<dyn StdError + Send + Sync + 'static>> {
    let raw = Base64Url::from_encoded(segment)?;
    let object: Map<String, Value> = serde_json::from_slice(raw.as_slice())?;
    Ok(serde_json::from_value(Value::Object(object))?)
}

impl JwtRef {
    /// Decomposes the JWT into its parts, decoding the header and payload
    ///
    /// # Errors
    ///
    /// The token does not have exactly three segments, or a segment is not
    /// valid base64url, or the header or payload is not a JSON object.
    pub fn decompose(&self) -> Result<Decomposed<'_>, error::JwtVerifyError> {
        let (s_str, message) =
            expect_two!(self.as_str().rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;
        let (p_str, h_str) =
            expect_two!(message.rsplitn(2, '.')).ok_or_else(error::malformed_jwt)?;

        if h_str.contains('.') {
            return Err(error::malformed_jwt().into());
        }

        let header: Headers = decode_object(h_str).map_err(error::malformed_jwt_header)?;
        let claims: Claims = decode_object(p_str).map_err(error::malformed_jwt_payload)?;
        let signature = Base64Url::from_encoded(s_str).map_err(error::malformed_jwt_signature)?;

        Ok(Decomposed {
            header,
            message,
            claims,
            signature,
        })
    }
}

/// Resolves a key identifier to a trusted signing key
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Looks up the key with the given identifier
    ///
    /// # Errors
    ///
    /// No key is known under `kid`, or the key source could not be reached
    /// and no keys were available to fall back on.
    async fn resolve(&self, kid: &jwk::KeyIdRef) -> Result<Arc<SigningKey>, error::ResolveError>;
}

#[async_trait]
impl<R: KeyResolver + ?Sized> KeyResolver for &'_ R {
    async fn resolve(&self, kid: &jwk::KeyIdRef) -> Result<Arc<SigningKey>, error::ResolveError> {
        R::resolve(self, kid).await
    }
}

#[async_trait]
impl<R: KeyResolver + ?Sized> KeyResolver for Arc<R> {
    async fn resolve(&self, kid: &jwk::KeyIdRef) -> Result<Arc<SigningKey>, error::ResolveError> {
        R::resolve(self, kid).await
    }
}

/// A core validator for JWTs
///
/// The default validator accepts any supported algorithm, any issuer and
/// any audience, tolerates no clock skew, and only checks `exp` when the
/// token carries one.
#[derive(Clone, Debug)]
#[must_use]
pub struct CoreValidator<C = System> {
    approved_algorithms: Vec<jwa::Algorithm>,
    leeway: Duration,
    require_exp: bool,
    allowed_audiences: Vec<Audience>,
    issuer: Option<Issuer>,
    clock: C,
}

impl Default for CoreValidator {
    #[inline]
    fn default() -> Self {
        Self {
            approved_algorithms: Vec::new(),
            leeway: Duration::default(),
            require_exp: false,
            allowed_audiences: Vec::new(),
            issuer: None,
            clock: System,
        }
    }
}

impl<C> CoreValidator<C> {
    /// Allows a grace period for token validation
    ///
    /// Applies on either side of the `exp`, `nbf` and `iat` claims.
    #[inline]
    pub fn with_leeway(self, leeway: Duration) -> Self {
        Self { leeway, ..self }
    }

    /// Allows a grace period (in seconds) for token validation
    #[inline]
    pub fn with_leeway_secs(self, leeway: u64) -> Self {
        self.with_leeway(Duration::from_secs(leeway))
    }

    /// Rejects tokens that carry no `exp` claim
    #[inline]
    pub fn require_expiration(self) -> Self {
        Self {
            require_exp: true,
            ..self
        }
    }

    /// Adds a single audience to the set of allowed audiences
    #[inline]
    pub fn add_allowed_audience(mut self, audience: Audience) -> Self {
        self.allowed_audiences.push(audience);
        self
    }

    /// Adds multiple audiences to the set of allowed audiences
    #[inline]
    pub fn extend_allowed_audiences<I: IntoIterator<Item = Audience>>(mut self, aud: I) -> Self {
        self.allowed_audiences.extend(aud);
        self
    }

    /// Approves a single algorithm
    ///
    /// Once any algorithm is approved, tokens signed with other algorithms
    /// are rejected.
    #[inline]
    pub fn add_approved_algorithm(mut self, alg: jwa::Algorithm) -> Self {
        self.approved_algorithms.push(alg);
        self
    }

    /// Approves multiple algorithms
    #[inline]
    pub fn extend_approved_algorithms<I: IntoIterator<Item = jwa::Algorithm>>(
        mut self,
        alg: I,
    ) -> Self {
        self.approved_algorithms.extend(alg);
        self
    }

    /// Require that tokens specify a particular issuer
    #[inline]
    pub fn require_issuer(self, issuer: Issuer) -> Self {
        Self {
            issuer: Some(issuer),
            ..self
        }
    }

    /// Uses the given clock to judge the time-based claims
    #[inline]
    pub fn with_clock<D: Clock>(self, clock: D) -> CoreValidator<D> {
        CoreValidator {
            approved_algorithms: self.approved_algorithms,
            leeway: self.leeway,
            require_exp: self.require_exp,
            allowed_audiences: self.allowed_audiences,
            issuer: self.issuer,
            clock,
        }
    }
}

impl<C: Clock> CoreValidator<C> {
    /// Validates a token, resolving its signing key through `resolver`
    ///
    /// Checks run in this order: structure, time-based claims, algorithm,
    /// key resolution, signature, then issuer and audience. A token that
    /// is malformed or outside its validity window never causes a key
    /// lookup.
    ///
    /// # Errors
    ///
    /// Returns the first check that fails.
    pub async fn validate<R: KeyResolver + ?Sized>(
        &self,
        token: &JwtRef,
        resolver: &R,
    ) -> Result<Validated, error::JwtVerifyError> {
        let decomposed = token.decompose()?;

        self.check_timing(&decomposed.claims)?;

        let alg = decomposed
            .header
            .alg()
            .map_err(error::JwkVerifyError::from)?;

        if !self.approved_algorithms.is_empty() && !self.approved_algorithms.contains(&alg) {
            return Err(error::ClaimsRejected::InvalidAlgorithm.into());
        }

        let kid = decomposed
            .header
            .kid()
            .ok_or_else(|| error::unknown_key_id(None))?;

        let key = resolver.resolve(kid).await?;

        key.verify(
            alg,
            decomposed.message.as_bytes(),
            decomposed.signature.as_slice(),
        )?;

        self.check_claims(&decomposed.claims)?;

        Ok(Validated {
            headers: decomposed.header,
            claims: decomposed.claims,
        })
    }

    fn check_timing(&self, claims: &Claims) -> Result<(), error::ClaimsRejected> {
        let now = self.clock.now();
        let leeway = DurationSecs::from(self.leeway);

        match claims.exp() {
            Some(exp) if exp < now - leeway => return Err(error::ClaimsRejected::TokenExpired),
            None if self.require_exp => {
                return Err(error::ClaimsRejected::MissingRequiredClaim("exp"))
            }
            _ => {}
        }

        if let Some(nbf) = claims.nbf() {
            if nbf > now + leeway {
                return Err(error::ClaimsRejected::TokenNotYetValid);
            }
        }

        if let Some(iat) = claims.iat() {
            if iat > now + leeway {
                return Err(error::ClaimsRejected::TokenIssuedInFuture);
            }
        }

        Ok(())
    }

    fn check_claims(&self, claims: &Claims) -> Result<(), error::ClaimsRejected> {
        if let Some(allowed_iss) = &self.issuer {
            match claims.iss() {
                Some(iss) if iss == &**allowed_iss => {}
                Some(_) => return Err(error::ClaimsRejected::InvalidIssuer),
                None => return Err(error::ClaimsRejected::MissingRequiredClaim("iss")),
            }
        }

        if !self.allowed_audiences.is_empty() {
            if claims.aud().is_empty() {
                return Err(error::ClaimsRejected::MissingRequiredClaim("aud"));
            }

            let found = claims
                .aud()
                .iter()
                .any(|a| self.allowed_audiences.iter().any(|e| a == &**e));
            if !found {
                return Err(error::ClaimsRejected::InvalidAudience);
            }
        }

        Ok(())
    }
}
