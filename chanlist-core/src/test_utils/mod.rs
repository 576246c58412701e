//! Test fixtures and helpers shared by unit tests

pub mod assertions;
pub mod async_helpers;
pub mod fixtures;
