//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::convert::TryFrom;

use aliri_braid::braid;
use serde::{Deserialize, Serialize, Serializer};

use crate::{error, jwa, jws::Verifier};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// A public JSON Web Key usable for signature verification
///
/// Keys are immutable once constructed. A refreshed key set replaces its
/// keys wholesale rather than updating them in place.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct SigningKey {
    key_id: Option<KeyId>,
    usage: Option<jwa::Usage>,
    algorithm: Option<jwa::Algorithm>,
    key: Key,
}

impl SigningKey {
    fn from_key(key: Key) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            key,
        }
    }

    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm declared for this key
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// Whether the key material can verify signatures made with `alg`
    ///
    /// This only considers the key type and curve. The declared algorithm
    /// and usage are checked at verification time.
    #[must_use]
    pub fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        self.key.is_compatible(alg)
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: KeyId) -> Self {
        Self {
            key_id: Some(kid),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Sets the algorithm and usage consistent with that algorithm
    pub fn with_algorithm(self, alg: impl Into<jwa::Algorithm>) -> Self {
        let alg = alg.into();
        Self {
            algorithm: Some(alg),
            usage: Some(alg.to_usage()),
            ..self
        }
    }
}

impl From<jwa::Rsa> for SigningKey {
    fn from(key: jwa::Rsa) -> Self {
        Self::from_key(Key::Rsa(key))
    }
}

impl From<jwa::EllipticCurve> for SigningKey {
    fn from(key: jwa::EllipticCurve) -> Self {
        Self::from_key(Key::EllipticCurve(key))
    }
}

impl From<jwa::OctetKeyPair> for SigningKey {
    fn from(key: jwa::OctetKeyPair) -> Self {
        Self::from_key(Key::OctetKeyPair(key))
    }
}

impl Verifier for SigningKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.usage.map_or(true, |u| u == jwa::Usage::Signing)
            && self.algorithm.map_or(true, |a| a == alg)
            && self.key.is_compatible(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if let Some(u) = self.usage {
            if u != jwa::Usage::Signing {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg) if key_alg != alg => {
                return Err(error::incompatible_algorithm(alg).into());
            }
            _ => {}
        }

        self.key.verify(alg, data, signature)
    }
}

#[derive(Deserialize)]
struct JwkDto {
    #[serde(rename = "kid", default)]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default)]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default)]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: Key,
}

impl TryFrom<JwkDto> for SigningKey {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        if let Some(alg) = dto.algorithm {
            if !dto.key.is_compatible(alg) {
                return Err(error::incompatible_algorithm(alg));
            }
        }

        Ok(Self {
            key_id: dto.key_id,
            usage: dto.usage,
            algorithm: dto.algorithm,
            key: dto.key,
        })
    }
}

#[derive(Serialize)]
struct JwkDtoRef<'a> {
    #[serde(rename = "kid", skip_serializing_if = "Option::is_none")]
    key_id: Option<&'a KeyIdRef>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: &'a Key,
}

impl Serialize for SigningKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let dto = JwkDtoRef {
            key_id: self.key_id(),
            usage: self.usage(),
            algorithm: self.algorithm(),
            key: &self.key,
        };

        dto.serialize(serializer)
    }
}

/// Public key material, tagged by key type
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kty")]
enum Key {
    #[serde(rename = "RSA")]
    Rsa(jwa::Rsa),

    #[serde(rename = "EC")]
    EllipticCurve(jwa::EllipticCurve),

    #[serde(rename = "OKP")]
    OctetKeyPair(jwa::OctetKeyPair),
}

impl Key {
    fn is_compatible(&self, alg: jwa::Algorithm) -> bool {
        match (self, alg) {
            (Self::Rsa(k), jwa::Algorithm::Rsa(a)) => k.can_verify(a),
            (Self::EllipticCurve(k), jwa::Algorithm::EllipticCurve(a)) => k.can_verify(a),
            (Self::OctetKeyPair(k), jwa::Algorithm::OctetKeyPair(a)) => k.can_verify(a),
            _ => false,
        }
    }

    fn verify(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::JwkVerifyError> {
        match (self, alg) {
            (Self::Rsa(k), jwa::Algorithm::Rsa(a)) => Ok(k.verify(a, data, signature)?),
            (Self::EllipticCurve(k), jwa::Algorithm::EllipticCurve(a)) if k.can_verify(a) => {
                Ok(k.verify(a, data, signature)?)
            }
            (Self::OctetKeyPair(k), jwa::Algorithm::OctetKeyPair(a)) => {
                Ok(k.verify(a, data, signature)?)
            }
            _ => Err(error::incompatible_algorithm(alg).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    const EC_JWK: &str = r#"{
        "kty": "EC",
        "kid": "ec-1",
        "use": "sig",
        "alg": "ES256",
        "crv": "P-256",
        "x": "f83OJ3D2xF1Bg8vub9tLe1gHMzV76e8Tus9uPHvRVEU",
        "y": "x_FEzRu9m36HLN_tue659LNpXW6pCyStikYjKIWI5a0"
    }"#;

    const OKP_JWK: &str = r#"{
        "kty": "OKP",
        "kid": "ed-1",
        "crv": "Ed25519",
        "x": "11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"
    }"#;

    #[test]
    fn decodes_ec_key() -> Result<()> {
        let key: SigningKey = serde_json::from_str(EC_JWK)?;

        assert_eq!(key.key_id(), Some(KeyIdRef::from_str("ec-1")));
        assert_eq!(key.algorithm(), Some(jwa::Algorithm::ES256));
        assert_eq!(key.usage(), Some(jwa::Usage::Signing));
        assert!(key.is_compatible(jwa::Algorithm::ES256));
        assert!(!key.is_compatible(jwa::Algorithm::ES384));
        assert!(!key.is_compatible(jwa::Algorithm::RS256));
        Ok(())
    }

    #[test]
    fn decodes_okp_key_without_alg() -> Result<()> {
        let key: SigningKey = serde_json::from_str(OKP_JWK)?;

        assert_eq!(key.algorithm(), None);
        assert!(key.can_verify(jwa::Algorithm::EDDSA));
        Ok(())
    }

    #[test]
    fn rejects_declared_alg_incompatible_with_key() {
        let json = EC_JWK.replace(r#""alg": "ES256""#, r#""alg": "RS256""#);
        assert!(serde_json::from_str::<SigningKey>(&json).is_err());
    }

    #[test]
    fn encryption_keys_cannot_verify() -> Result<()> {
        let key: SigningKey = serde_json::from_str(&EC_JWK.replace("\"sig\"", "\"enc\""))?;

        assert!(!key.can_verify(jwa::Algorithm::ES256));
        let err = key
            .verify(jwa::Algorithm::ES256, b"data", &[0; 64])
            .unwrap_err();
        assert!(err.is_usage_mismatch());
        Ok(())
    }

    #[test]
    fn declared_alg_must_match_token_alg() -> Result<()> {
        let key: SigningKey = serde_json::from_str(EC_JWK)?;

        let err = key
            .verify(jwa::Algorithm::ES384, b"data", &[0; 96])
            .unwrap_err();
        assert!(err.is_incompatible_alg());
        Ok(())
    }

    #[test]
    fn serialization_keeps_wire_names() -> Result<()> {
        let key: SigningKey = serde_json::from_str(OKP_JWK)?;
        let value = serde_json::to_value(&key)?;

        assert_eq!(value["kty"], "OKP");
        assert_eq!(value["kid"], "ed-1");
        assert_eq!(value["crv"], "Ed25519");
        assert!(value.get("alg").is_none());

        let back: SigningKey = serde_json::from_value(value)?;
        assert_eq!(back, key);
        Ok(())
    }
}
