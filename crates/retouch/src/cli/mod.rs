//! Command handlers for the `retouch` binary.

pub mod common;
pub mod config;
pub mod preview;
pub mod process;
