//! Persistence and interchange formats.
//!
//! - [`codec`] - the exact binary trajectory encoding used by the cache
//! - [`fixture_file`] - TOML fixture descriptions (atoms, anchors, constraint, springs)
//! - [`xyz`] - multi-frame XYZ export and import for visualization tools
//! - [`diagnostics`] - per-frame CSV tables

pub mod codec;
pub mod diagnostics;
pub mod fixture_file;
pub mod traits;
pub mod xyz;
