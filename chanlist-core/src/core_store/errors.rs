//! Store error types

use std::fmt;

use thiserror::Error;

use crate::core_backend::BackendError;

/// Which registry a member name belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Getter,
    Mutation,
    Action,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Getter => write!(f, "getter"),
            MemberKind::Mutation => write!(f, "mutation"),
            MemberKind::Action => write!(f, "action"),
        }
    }
}

/// A mutation payload that does not satisfy the mutation's contract.
///
/// Handled by the store's [`ValidationPolicy`](super::ValidationPolicy),
/// never returned to the committer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MutationError {
    #[error("missing identifier `{field}`")]
    MissingIdentifier { field: &'static str },

    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// Errors raised while assembling a root store. The store refuses to start.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("invalid namespace `{0}`")]
    InvalidNamespace(String),

    #[error("namespace `{0}` is already registered")]
    DuplicateNamespace(String),

    #[error("{kind} `{path}` is already registered")]
    DuplicateMember { kind: MemberKind, path: String },
}

/// Routing and serialization failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no module registered under namespace `{0}`")]
    UnknownNamespace(String),

    #[error("unknown mutation `{0}`")]
    UnknownMutation(String),

    #[error("unknown action `{0}`")]
    UnknownAction(String),

    #[error("unknown getter `{0}`")]
    UnknownGetter(String),

    #[error("invalid arguments for getter `{path}`: {reason}")]
    InvalidGetterArgs { path: String, reason: String },

    #[error("module under `{namespace}` is not of the requested type")]
    ModuleTypeMismatch { namespace: String },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn unknown(kind: MemberKind, path: &str) -> Self {
        match kind {
            MemberKind::Getter => StoreError::UnknownGetter(path.to_string()),
            MemberKind::Mutation => StoreError::UnknownMutation(path.to_string()),
            MemberKind::Action => StoreError::UnknownAction(path.to_string()),
        }
    }
}

/// The rejected outcome of a dispatched action
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid payload for `{path}`: {reason}")]
    InvalidPayload { path: String, reason: String },

    #[error("action aborted: {0}")]
    Aborted(String),
}

impl ActionError {
    pub fn invalid_payload(path: impl Into<String>, reason: impl Into<String>) -> Self {
        ActionError::InvalidPayload {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The backend error behind this failure, if any
    pub fn backend(&self) -> Option<&BackendError> {
        match self {
            ActionError::Backend(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composition_error_display() {
        let err = CompositionError::DuplicateMember {
            kind: MemberKind::Mutation,
            path: "channelList/setPage".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "mutation `channelList/setPage` is already registered"
        );
    }

    #[test]
    fn test_action_error_from_backend() {
        let err: ActionError = BackendError::Network("refused".to_string()).into();
        assert!(matches!(err.backend(), Some(BackendError::Network(_))));
    }

    #[test]
    fn test_unknown_picks_kind() {
        assert!(matches!(
            StoreError::unknown(MemberKind::Action, "a/b"),
            StoreError::UnknownAction(path) if path == "a/b"
        ));
    }
}
