// src/config/mod.rs

//! Engine configuration.
//!
//! - [`model`] holds the TOML-backed data model.
//! - [`loader`] reads an optional config file from disk.
//! - [`validate`] turns a raw file into a checked [`EngineConfig`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_or_default};
pub use model::{EngineConfig, EngineSection, PtySection, RawConfigFile};
