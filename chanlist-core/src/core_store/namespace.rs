//! Namespace paths

use super::errors::CompositionError;

/// Check that `namespace` is a `/`-separated path of non-empty
/// `[A-Za-z0-9_-]` segments.
pub fn validate(namespace: &str) -> Result<(), CompositionError> {
    let valid = !namespace.is_empty()
        && namespace.split('/').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });

    if valid {
        Ok(())
    } else {
        Err(CompositionError::InvalidNamespace(namespace.to_string()))
    }
}

/// Fully qualified name of a module member
pub fn qualify(namespace: &str, namespaced: bool, name: &str) -> String {
    if namespaced {
        format!("{}/{}", namespace, name)
    } else {
        name.to_string()
    }
}
