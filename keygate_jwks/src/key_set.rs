use std::{
    collections::{hash_map::Entry, HashMap},
    sync::Arc,
};

use keygate::{
    jwk::{KeyId, KeyIdRef},
    Jwks, SigningKey,
};
use keygate_clock::UnixTime;

/// An immutable snapshot of signing keys indexed by key ID
///
/// A key set is built in one step from one fetched document and is never
/// modified afterwards. Refreshing the cache swaps in a new snapshot.
#[derive(Clone, Debug, Default)]
pub struct KeySet {
    keys: HashMap<KeyId, Arc<SigningKey>>,
    fetched_at: Option<UnixTime>,
}

impl KeySet {
    /// Indexes the keys of `jwks`
    ///
    /// Keys without a `kid` cannot be selected by a token and are dropped.
    /// When a `kid` is repeated, the first key carrying it wins.
    #[must_use]
    pub fn from_jwks(jwks: Jwks, fetched_at: UnixTime) -> Self {
        let mut keys = HashMap::with_capacity(jwks.keys().len());

        for key in jwks.into_keys() {
            let Some(kid) = key.key_id().map(ToOwned::to_owned) else {
                tracing::warn!("ignoring JWK without a key ID");
                continue;
            };

            match keys.entry(kid) {
                Entry::Occupied(entry) => {
                    tracing::warn!(jwk.kid = %entry.key(), "ignoring JWK with duplicate key ID");
                }
                Entry::Vacant(entry) => {
                    entry.insert(Arc::new(key));
                }
            }
        }

        Self {
            keys,
            fetched_at: Some(fetched_at),
        }
    }

    /// Gets the key with the given ID
    #[must_use]
    pub fn get(&self, kid: &KeyIdRef) -> Option<Arc<SigningKey>> {
        self.keys.get(kid).cloned()
    }

    /// The number of addressable keys
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no addressable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Whether this set came from a fetch, as opposed to the empty
    /// placeholder a cache starts with
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.fetched_at.is_some()
    }

    /// When the document behind this set was fetched
    #[must_use]
    pub fn fetched_at(&self) -> Option<UnixTime> {
        self.fetched_at
    }

    /// The key IDs in this set, in no particular order
    pub fn kids(&self) -> impl Iterator<Item = &KeyIdRef> {
        self.keys.keys().map(|k| &**k)
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;
    use keygate::test_util::{jwks_of, TestSigner};
    use tracing_test::traced_test;

    use super::*;

    #[test]
    #[traced_test]
    fn drops_keys_without_kid_and_keeps_first_duplicate() -> Result<()> {
        let first = TestSigner::es256("dup")?;
        let second = TestSigner::ed25519("dup")?;
        let other = TestSigner::es384("other")?;

        let mut jwks = jwks_of([&first, &second, &other]);
        jwks.add_key(serde_json::from_str(
            r#"{"kty":"OKP","crv":"Ed25519","x":"11qYAYKxCrfVS_7TyWQHOg7hcvPapiMlrwIaaPcHURo"}"#,
        )?);

        let set = KeySet::from_jwks(jwks, UnixTime(10));

        assert_eq!(set.len(), 2);
        assert!(set.is_loaded());
        assert_eq!(set.fetched_at(), Some(UnixTime(10)));

        let dup = set
            .get(KeyIdRef::from_str("dup"))
            .expect("duplicate kid should resolve");
        assert_eq!(*dup, first.signing_key());
        assert!(logs_contain("ignoring JWK without a key ID"));
        assert!(logs_contain("ignoring JWK with duplicate key ID"));
        Ok(())
    }

    #[test]
    fn default_set_is_not_loaded() {
        let set = KeySet::default();
        assert!(!set.is_loaded());
        assert!(set.is_empty());
        assert_eq!(set.kids().count(), 0);
    }
}
