//! Shared utilities for dcm.
//!
//! This crate provides cross-cutting concerns used by all other dcm crates:
//! the error taxonomy, filesystem helpers, content hashing, process
//! spawning, and terminal status output.

pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod progress;
