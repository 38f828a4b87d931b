//! Signature verification for compact JSON Web Signatures
//!
//! See [RFC7515][] for the serialization being verified.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::error::Error as StdError;

/// Public key material able to check a JWS signature
///
/// Implemented by each key family in [`jwa`][crate::jwa] and by
/// [`SigningKey`][crate::SigningKey], which adds the checks a JWK's
/// `use` and `alg` members impose.
pub trait Verifier {
    /// The algorithm identifiers this key family understands
    type Algorithm;

    /// Why a signature was not accepted
    type Error: StdError + Send + Sync + 'static;

    /// Whether a signature made with `alg` could be checked by this key
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Checks `signature` over `message` under `alg`
    ///
    /// `message` is the ASCII `header.payload` signing input and
    /// `signature` the decoded third segment.
    fn verify(
        &self,
        alg: Self::Algorithm,
        message: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}
