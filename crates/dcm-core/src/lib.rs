//! Core data types for dcm.
//!
//! This crate defines the fundamental types of a declarative operator
//! catalog: the blobs stored on disk, typed bundle properties, the owned
//! [`bundle::Bundle`] entity, package metadata, the directory-backed
//! catalog store, and global configuration.
//!
//! This crate is intentionally free of process spawning and network I/O.

pub mod bundle;
pub mod config;
pub mod declcfg;
pub mod package;
pub mod property;
pub mod store;
