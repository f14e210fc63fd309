//! SQLite backend for the settlement engine.
//!
//! [`SqliteDatabase`] implements every store trait in [`crate::traits`] against a single SQLite database.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
