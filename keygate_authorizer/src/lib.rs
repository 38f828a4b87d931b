//! Bearer token authorization for API gateway style request chains
//!
//! An [`Authorizer`] takes the raw `Authorization` header and the ARN of
//! the resource being accessed. It validates the token against keys held
//! in a [`keygate_jwks::KeySetCache`] and returns an allow [`Decision`]
//! naming the token's subject. Anything else is an [`AuthorizationError`];
//! there is no permissive fallback.
//!
//! # Example
//!
//! ```no_run
//! use keygate_authorizer::{Authorizer, AuthorizerConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AuthorizerConfig::new("https://issuer.example/.well-known/jwks.json");
//! let authorizer = Authorizer::from_config(&config)?;
//! let _refresh = authorizer.resolver().spawn_passive_refresh();
//!
//! let arn = "arn:aws:execute-api:us-east-1:123456789012:api/prod/GET/pets";
//! match authorizer.authorize(Some("Bearer eyJ..."), arn).await {
//!     Ok(decision) => println!("{}", serde_json::to_string(&decision.to_response())?),
//!     Err(err) => println!("{}", err.denial_message().unwrap_or("denied")),
//! }
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

mod authorizer;
mod config;
mod credential;
pub mod decision;
mod error;

pub use authorizer::Authorizer;
pub use config::AuthorizerConfig;
pub use credential::extract_bearer;
#[doc(inline)]
pub use decision::{AuthorizerResponse, Decision, Effect};
pub use error::AuthorizationError;
