//! Filesystem helpers for inputs and the output file.
//!
//! - [`compression`] - codec registry and transparent (de)compression
//! - [`glob`] - pattern expansion for input arguments

pub mod compression;
pub mod glob;
