//! Verify-only implementations of the Javascript/JSON Object Signing and
//! Encryption (JOSE) standards needed to authenticate bearer tokens:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//! * Edwards-curve signatures for JOSE: [RFC8037][]
//!
//! Only public keys are handled. Tokens are produced elsewhere; this crate
//! decides whether to trust them.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//! [RFC8037]: https://tools.ietf.org/html/rfc8037
//!
//! # Example
//!
//! ```no_run
//! use keygate::{jwt, Jwks, JwtRef};
//!
//! # async fn check(jwks: Jwks) -> Result<(), keygate::error::JwtVerifyError> {
//! let token = JwtRef::from_str("eyJhbGciOiJFUzI1NiIsImtpZCI6ImsxIn0.e30.c2ln");
//!
//! let validator = jwt::CoreValidator::default()
//!     .add_approved_algorithm(keygate::jwa::Algorithm::ES256)
//!     .require_issuer(jwt::Issuer::from_static("https://issuer.example"));
//!
//! let validated = validator.validate(token, &jwks).await?;
//! println!("subject: {:?}", validated.claims().sub());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;

#[doc(inline)]
pub use jwk::SigningKey;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef, KeyResolver};
