//! # Affinity Common Library
//!
//! Shared code for the Affinity services including:
//! - Preference data model (identities, categories, influences, selection events)
//! - SQLite Preference Store (schema, reads, writes, settings)
//! - Configuration loading and root folder resolution
//! - Error types and timestamp utilities

pub mod config;
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
