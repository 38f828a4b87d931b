use std::{iter::FromIterator, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error, jwk, KeyResolver, SigningKey};

/// A JSON Web Key Set (JWKS)
///
/// Deserialization is tolerant: members that are not usable verification
/// keys (symmetric keys, unsupported key types or curves, malformed
/// entries) are skipped with a warning rather than failing the whole set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<SigningKey>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: SigningKey) {
        self.keys.push(key);
    }

    /// A view of the keys in this set
    #[must_use]
    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    /// Consumes the set, returning its keys
    #[must_use]
    pub fn into_keys(self) -> Vec<SigningKey> {
        self.keys
    }

    /// Gets the first key carrying the given key ID
    #[must_use]
    pub fn get_key_by_id(&self, kid: &jwk::KeyIdRef) -> Option<&SigningKey> {
        self.keys.iter().find(|k| k.key_id() == Some(kid))
    }
}

impl FromIterator<SigningKey> for Jwks {
    fn from_iter<T: IntoIterator<Item = SigningKey>>(iter: T) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

#[async_trait]
impl KeyResolver for Jwks {
    async fn resolve(&self, kid: &jwk::KeyIdRef) -> Result<Arc<SigningKey>, error::ResolveError> {
        self.get_key_by_id(kid)
            .map(|k| Arc::new(k.clone()))
            .ok_or_else(|| error::unknown_key_id(Some(kid.to_owned())).into())
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<SigningKey>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<SigningKey>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kid = ?key.kid,
                            jwk.kty = ?key.kty,
                            "jwk.use" = ?key.r#use,
                            jwk.alg = ?key.alg,
                            "ignoring unusable JWK"
                        );
                    }
                    MaybeJwk::Other(_) => {
                        tracing::warn!(jwks.idx = index, "ignoring non-object JWK entry");
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(SigningKey),
        Unknown(JwkLike),
        Other(serde::de::IgnoredAny),
    }

    #[derive(Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kid: Option<String>,
        #[serde(default)]
        kty: Option<String>,
        #[serde(rename = "use", default)]
        r#use: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}
