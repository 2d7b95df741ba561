//! Shared types, error model, and configuration for controlkb.
//!
//! This crate is the foundation depended on by all other controlkb crates.
//! It provides:
//! - [`ControlKbError`]: the unified error type
//! - Domain types ([`Control`], [`Dependency`], [`CategoryTable`], [`RequestResult`])
//! - Configuration ([`AppConfig`], [`BuildConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BuildConfig, ExtractionConfig, PathsConfig, ScanConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from,
};
pub use error::{ControlKbError, Result};
pub use types::{
    CategoryTable, Control, ControlCategory, ControlSummary, Dependency, FallbackResult,
    RequestRecord, RequestResult,
};
