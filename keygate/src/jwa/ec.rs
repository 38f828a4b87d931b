//! ECC JSON Web Algorithm implementations

use std::{convert::TryFrom, fmt};

use aliri_base64::{Base64Url, Base64UrlRef};
use serde::{Deserialize, Serialize};

use crate::{error, jwa, jws};

/// A named ECC curve
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum Curve {
    /// The P-256 curve (prime256v1/secp256r1)
    #[serde(rename = "P-256")]
    P256,

    /// The P-384 curve (secp384r1)
    #[serde(rename = "P-384")]
    P384,
}

impl Curve {
    /// Size in bytes of a single affine coordinate on this curve
    #[must_use]
    pub const fn coordinate_size(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
        }
    }
}

/// Elliptic curve public key
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "EllipticCurveDto")]
#[must_use]
pub struct EllipticCurve {
    #[serde(rename = "crv")]
    curve: Curve,

    x: Base64Url,

    y: Base64Url,

    #[serde(skip)]
    point: Vec<u8>,
}

impl EllipticCurve {
    /// Constructs a public key from its affine coordinates
    ///
    /// # Errors
    ///
    /// A coordinate does not have the length required by the curve.
    pub fn from_coordinates(
        curve: Curve,
        x: impl Into<Base64Url>,
        y: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let x = x.into();
        let y = y.into();
        let size = curve.coordinate_size();

        if x.as_slice().len() != size || y.as_slice().len() != size {
            return Err(error::key_rejected(
                "EC coordinate length does not match the curve",
            ));
        }

        let mut point = Vec::with_capacity(1 + 2 * size);
        point.push(0x04);
        point.extend_from_slice(x.as_slice());
        point.extend_from_slice(y.as_slice());

        Ok(Self { curve, x, y, point })
    }

    /// Constructs a public key from an uncompressed SEC1 point (`0x04 || x || y`)
    ///
    /// # Errors
    ///
    /// The point is not uncompressed or does not fit the curve.
    pub fn from_uncompressed_point(curve: Curve, point: &[u8]) -> Result<Self, error::KeyRejected> {
        let size = curve.coordinate_size();
        match point.split_first() {
            Some((0x04, coords)) if coords.len() == 2 * size => {
                let (x, y) = coords.split_at(size);
                Self::from_coordinates(
                    curve,
                    Base64Url::from_raw(x.to_vec()),
                    Base64Url::from_raw(y.to_vec()),
                )
            }
            _ => Err(error::key_rejected("expected an uncompressed EC point")),
        }
    }

    /// The curve this key lies on
    pub fn curve(&self) -> Curve {
        self.curve
    }

    /// The x coordinate
    pub fn x(&self) -> &Base64UrlRef {
        &self.x
    }

    /// The y coordinate
    pub fn y(&self) -> &Base64UrlRef {
        &self.y
    }
}

/// Elliptic curve cryptography signing algorithms
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[non_exhaustive]
pub enum SigningAlgorithm {
    /// ECDSA using the P-256 curve and SHA-256
    ES256,
    /// ECDSA using the P-384 curve and SHA-384
    ES384,
}

impl SigningAlgorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
        }
    }

    /// Size in bytes of a fixed-width ECDSA signature
    #[must_use]
    pub const fn signature_size(self) -> usize {
        match self {
            Self::ES256 => 64,
            Self::ES384 => 96,
        }
    }

    fn verification_algorithm(self) -> &'static ring::signature::EcdsaVerificationAlgorithm {
        match self {
            Self::ES256 => &ring::signature::ECDSA_P256_SHA256_FIXED,
            Self::ES384 => &ring::signature::ECDSA_P384_SHA384_FIXED,
        }
    }
}

impl From<SigningAlgorithm> for Curve {
    fn from(alg: SigningAlgorithm) -> Self {
        match alg {
            SigningAlgorithm::ES256 => Self::P256,
            SigningAlgorithm::ES384 => Self::P384,
        }
    }
}

impl From<Curve> for SigningAlgorithm {
    fn from(crv: Curve) -> Self {
        match crv {
            Curve::P256 => Self::ES256,
            Curve::P384 => Self::ES384,
        }
    }
}

impl TryFrom<jwa::Algorithm> for SigningAlgorithm {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(alg: jwa::Algorithm) -> Result<Self, Self::Error> {
        match alg {
            jwa::Algorithm::EllipticCurve(alg) => Ok(alg),
            _ => Err(error::incompatible_algorithm(alg)),
        }
    }
}

impl fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl jws::Verifier for EllipticCurve {
    type Algorithm = SigningAlgorithm;
    type Error = error::SignatureMismatch;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        Curve::from(alg) == self.curve
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) || signature.len() != alg.signature_size() {
            return Err(error::signature_mismatch());
        }

        ring::signature::UnparsedPublicKey::new(alg.verification_algorithm(), &self.point)
            .verify(data, signature)
            .map_err(|_| error::signature_mismatch())
    }
}

impl TryFrom<EllipticCurveDto> for EllipticCurve {
    type Error = error::KeyRejected;

    fn try_from(dto: EllipticCurveDto) -> Result<Self, Self::Error> {
        Self::from_coordinates(dto.curve, dto.x, dto.y)
    }
}

#[derive(Deserialize)]
struct EllipticCurveDto {
    #[serde(rename = "crv")]
    curve: Curve,
    x: Base64Url,
    y: Base64Url,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_coordinates() {
        let result = EllipticCurve::from_coordinates(
            Curve::P256,
            Base64Url::from_raw(vec![1; 31]),
            Base64Url::from_raw(vec![1; 32]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn p384_coordinates_do_not_fit_p256() {
        let result = EllipticCurve::from_coordinates(
            Curve::P256,
            Base64Url::from_raw(vec![1; 48]),
            Base64Url::from_raw(vec![1; 48]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn rejects_compressed_point() {
        let mut point = vec![0x02];
        point.extend([9; 32]);
        assert!(EllipticCurve::from_uncompressed_point(Curve::P256, &point).is_err());
    }

    #[test]
    fn curve_names_match_registry() {
        let crv: Curve = serde_json::from_str(r#""P-384""#).unwrap();
        assert_eq!(crv, Curve::P384);
        assert!(serde_json::from_str::<Curve>(r#""P-521""#).is_err());
    }
}
