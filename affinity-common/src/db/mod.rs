//! Preference Store: SQLite persistence for identities, categories,
//! influences, selection events and settings

pub mod categories;
pub mod identities;
pub mod influences;
pub mod init;
pub mod models;
pub mod selections;
pub mod settings;
pub mod store;

pub use init::{init_database, init_in_memory, init_schema};
pub use models::*;
pub use store::{PreferenceStore, SqliteStore};
