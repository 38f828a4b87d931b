//! A key set cache for validating bearer tokens against a remotely
//! published JSON Web Key Set (JWKS)
//!
//! The [`KeySetCache`] loads keys from a [`KeySource`] on first use and
//! keeps them fresh:
//!
//! * a passive task refreshes them on a fixed interval,
//! * a lookup for an unknown key ID forces a refresh, at most once per
//!   rate limit window,
//! * a lookup against a stale set kicks off a background refresh.
//!
//! A failed refresh never discards keys that were already loaded.
//!
//! The cache implements [`keygate::KeyResolver`], so it can be handed
//! directly to [`keygate::jwt::CoreValidator::validate`].

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

mod cache;
mod error;
mod key_set;
#[cfg(feature = "reqwest")]
mod remote;
mod source;

pub use cache::{CacheConfig, KeySetCache, KeySetCacheBuilder, RefreshHandle, RefreshObserver};
pub use error::FetchError;
pub use key_set::KeySet;
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub use remote::RemoteKeySource;
pub use source::{KeySource, StaticKeySource};
