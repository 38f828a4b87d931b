//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for these algorithms can be found in [RFC7518][]
//! and, for Edwards-curve keys, [RFC8037][].
//!
//! Only asymmetric signature algorithms are supported. Shared-secret
//! algorithms (`HS*`) and `none` are deliberately absent: a public key set
//! can never vouch for them.
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC8037]: https://tools.ietf.org/html/rfc8037

use std::{convert::TryFrom, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error;

pub mod ec;
pub mod okp;
pub mod rsa;

#[doc(inline)]
pub use ec::EllipticCurve;
#[doc(inline)]
pub use okp::OctetKeyPair;
#[doc(inline)]
pub use rsa::Rsa;

/// A signature algorithm that can be named in a JWT header or a JWK
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[non_exhaustive]
pub enum Algorithm {
    /// RSA public/private key pair
    Rsa(rsa::SigningAlgorithm),

    /// Elliptic curve cryptography
    EllipticCurve(ec::SigningAlgorithm),

    /// Edwards-curve octet key pair
    OctetKeyPair(okp::SigningAlgorithm),
}

impl Algorithm {
    /// The RS256 signing algorithm
    pub const RS256: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS256);
    /// The RS384 signing algorithm
    pub const RS384: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS384);
    /// The RS512 signing algorithm
    pub const RS512: Algorithm = Self::Rsa(rsa::SigningAlgorithm::RS512);
    /// The PS256 signing algorithm
    pub const PS256: Algorithm = Self::Rsa(rsa::SigningAlgorithm::PS256);
    /// The PS384 signing algorithm
    pub const PS384: Algorithm = Self::Rsa(rsa::SigningAlgorithm::PS384);
    /// The PS512 signing algorithm
    pub const PS512: Algorithm = Self::Rsa(rsa::SigningAlgorithm::PS512);
    /// The ES256 signing algorithm
    pub const ES256: Algorithm = Self::EllipticCurve(ec::SigningAlgorithm::ES256);
    /// The ES384 signing algorithm
    pub const ES384: Algorithm = Self::EllipticCurve(ec::SigningAlgorithm::ES384);
    /// The EdDSA signing algorithm
    pub const EDDSA: Algorithm = Self::OctetKeyPair(okp::SigningAlgorithm::EdDSA);

    /// The registered name of the algorithm
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rsa(a) => a.as_str(),
            Self::EllipticCurve(a) => a.as_str(),
            Self::OctetKeyPair(a) => a.as_str(),
        }
    }

    /// Gets the usage related to this algorithm
    pub fn to_usage(self) -> Usage {
        Usage::Signing
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&'_ str> for Algorithm {
    type Error = error::UnknownAlgorithm;

    #[inline]
    fn try_from(value: &'_ str) -> Result<Self, Self::Error> {
        match value {
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            "PS256" => Ok(Algorithm::PS256),
            "PS384" => Ok(Algorithm::PS384),
            "PS512" => Ok(Algorithm::PS512),
            "ES256" => Ok(Algorithm::ES256),
            "ES384" => Ok(Algorithm::ES384),
            "EdDSA" => Ok(Algorithm::EDDSA),
            _ => Err(error::unknown_algorithm(value)),
        }
    }
}

impl TryFrom<String> for Algorithm {
    type Error = error::UnknownAlgorithm;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<Algorithm> for String {
    fn from(alg: Algorithm) -> Self {
        alg.as_str().to_owned()
    }
}

impl From<rsa::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: rsa::SigningAlgorithm) -> Self {
        Self::Rsa(alg)
    }
}

impl From<ec::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: ec::SigningAlgorithm) -> Self {
        Self::EllipticCurve(alg)
    }
}

impl From<okp::SigningAlgorithm> for Algorithm {
    #[inline]
    fn from(alg: okp::SigningAlgorithm) -> Self {
        Self::OctetKeyPair(alg)
    }
}

/// The intended use for a JWK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The key is intended for signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The key is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}
