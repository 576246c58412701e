//! Assertion helpers

use std::fmt::Debug;

use crate::core_store::StoreEvent;

/// Assert that a Result is Ok and return the value
pub fn assert_ok<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("Expected Ok, got Err: {:?}", e),
    }
}

/// Assert that a Result is Err and return the error.
/// The `Ok` type need not be `Debug`; builders usually are not.
pub fn assert_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected Err, got Ok({})", std::any::type_name::<T>()),
        Err(e) => e,
    }
}

/// Paths of the `Committed` events, in order
pub fn committed_paths(events: &[StoreEvent]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            StoreEvent::Committed { path, .. } => Some(path.as_str()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Opaque;

    #[test]
    fn test_assert_err_with_non_debug_ok_type() {
        let result: Result<Opaque, &str> = Err("nope");
        assert_eq!(assert_err(result), "nope");
    }

    #[test]
    #[should_panic(expected = "Expected Err, got Ok")]
    fn test_assert_err_panics_on_ok() {
        let result: Result<Opaque, &str> = Ok(Opaque);
        assert_err(result);
    }
}
