use std::{error::Error as StdError, sync::Arc, time::Duration};

use thiserror::Error;

type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// An error while fetching a key set from its source
///
/// Cloning is cheap. One failed refresh is reported to every caller that
/// was waiting on it.
#[derive(Clone, Debug, Error)]
pub enum FetchError {
    /// The key source could not be reached
    #[error("unable to reach key source")]
    Transport(#[source] SharedError),

    /// The key source answered with an unexpected status
    #[error("key source responded with unexpected status {status}")]
    Status {
        /// The HTTP status code received
        status: u16,
    },

    /// The key source answered with a document that is not a key set
    #[error("key source returned an undecodable key set")]
    Decode(#[source] SharedError),

    /// The key source did not answer in time
    #[error("key source did not respond within {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Wraps a transport-level failure
    pub fn transport(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Transport(Arc::from(source.into()))
    }

    /// Wraps a failure to decode the key set document
    pub fn decode(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Decode(Arc::from(source.into()))
    }

    /// Whether the fetch was abandoned after the configured timeout
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// The HTTP status code, if the source answered with an unexpected one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status } => Some(*status),
            _ => None,
        }
    }
}
