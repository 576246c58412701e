//! Handling of malformed mutation payloads

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::errors::MutationError;

/// What the store does with a mutation whose payload is malformed.
///
/// Development builds abort; release builds log and treat the commit as a
/// no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Panic on a malformed payload
    Strict,
    /// Log at `warn` and leave state untouched
    Lenient,
}

impl ValidationPolicy {
    /// `Strict` with debug assertions enabled, `Lenient` otherwise
    pub fn for_build() -> Self {
        if cfg!(debug_assertions) {
            ValidationPolicy::Strict
        } else {
            ValidationPolicy::Lenient
        }
    }

    /// Explicit override from configuration, falling back to [`Self::for_build`]
    pub fn from_flag(strict: Option<bool>) -> Self {
        match strict {
            Some(true) => ValidationPolicy::Strict,
            Some(false) => ValidationPolicy::Lenient,
            None => Self::for_build(),
        }
    }

    pub(crate) fn reject(self, path: &str, error: &MutationError) {
        match self {
            ValidationPolicy::Strict => panic!("mutation `{path}` rejected: {error}"),
            ValidationPolicy::Lenient => {
                warn!(mutation = path, %error, "ignoring malformed mutation payload");
            }
        }
    }
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        Self::for_build()
    }
}
