//! Common utilities and types shared across mini-goga components.

pub mod error;
pub mod logging;

pub use error::{Error, Result};
