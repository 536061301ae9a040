//! Shared error definitions and helpers used across all chatbridge crates.

pub mod error;

pub use error::{Error, FromMessage, Result};
