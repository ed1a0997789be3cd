//! Library entry for filebot components used by the binary and tests.

pub mod bot;
pub mod config;
pub mod error;
pub mod storage;
pub mod validation;
#[cfg(feature = "telegram")]
pub mod telegram;
