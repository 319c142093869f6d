//! Command-line interface for the engine.
//! This module is not part of the public library API.

pub mod args;
pub mod commands;

pub use args::Tactician;
