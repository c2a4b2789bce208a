//! kbmirror core library: path identity, manifest persistence, configuration.
//!
//! Public API surface:
//! - [`pathkey`]: [`PathKey`] and the separator-agnostic normaliser
//! - [`types`]: manifest and destination entry structs, timestamp helpers
//! - [`manifest`]: load / parse / save of the authoritative mapping
//! - [`config`]: the explicit [`MirrorConfig`] passed to every entry point
//! - [`error`]: [`ManifestError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod manifest;
pub mod pathkey;
pub mod types;

pub use config::MirrorConfig;
pub use error::{ConfigError, ManifestError};
pub use manifest::Manifest;
pub use pathkey::PathKey;
pub use types::{ContentLocator, DestinationEntry, ManifestEntry};
