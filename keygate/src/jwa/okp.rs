//! Octet key pair (Edwards-curve) JSON Web Algorithm implementations
//!
//! See [RFC8037](https://tools.ietf.org/html/rfc8037).

use std::{convert::TryFrom, fmt};

use aliri_base64::{Base64Url, Base64UrlRef};
use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

const ED25519_KEY_SIZE: usize = 32;
const ED25519_SIGNATURE_SIZE: usize = 64;

/// A named Edwards curve
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// Ed25519 signature curve
    Ed25519,
}

/// Octet key pair public key
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "OctetKeyPairDto")]
#[must_use]
pub struct OctetKeyPair {
    #[serde(rename = "crv")]
    curve: Curve,

    x: Base64Url,
}

impl OctetKeyPair {
    /// Constructs an Ed25519 public key from its raw encoding
    ///
    /// # Errors
    ///
    /// The key is not exactly 32 bytes.
    pub fn ed25519(x: impl Into<Base64Url>) -> Result<Self, error::KeyRejected> {
        let x = x.into();
        if x.as_slice().len() != ED25519_KEY_SIZE {
            return Err(error::key_rejected("Ed25519 public key must be 32 bytes"));
        }

        Ok(Self {
            curve: Curve::Ed25519,
            x,
        })
    }

    /// The curve this key lies on
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The public key
    pub fn x(&self) -> &Base64UrlRef {
        &self.x
    }
}

/// Edwards-curve signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// Edwards-curve digital signatures
    EdDSA,
}

impl SigningAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EdDSA => "EdDSA",
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::OctetKeyPair(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl jws::Verifier for OctetKeyPair {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, _alg: Self::Algorithm) -> bool {
        true
    }

    fn verify(
        &self,
        _alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if signature.len() != ED25519_SIGNATURE_SIZE {
            return Err(error::signature_mismatch());
        }

        ring::signature::UnparsedPublicKey::new(&ring::signature::ED25519, self.x.as_slice())
            .verify(data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl TryFrom<OctetKeyPairDto> for OctetKeyPair {
    type Error = error::KeyRejected;

    fn try_from(dto: OctetKeyPairDto) -> Result<Self, Self::Error> {
        match dto.curve {
            Curve::Ed25519 => Self::ed25519(dto.x),
        }
    }
}

#[derive(Deserialize)]
struct OctetKeyPairDto {
    #[serde(rename = "crv")]
    curve: Curve,
    x: Base64Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_wrong_length() {
        assert!(OctetKeyPair::ed25519(Base64Url::from_raw(vec![3; 31])).is_err());
        assert!(OctetKeyPair::ed25519(Base64Url::from_raw(vec![3; 32])).is_ok());
    }

    #[test]
    fn rejects_x25519() {
        let json = r#"{"crv":"X25519","x":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA"}"#;
        assert!(serde_json::from_str::<OctetKeyPair>(json).is_err());
    }
}
