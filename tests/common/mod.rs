//! Shared test fixtures (used by unit, functional, proptest, and integration).

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
