//! # mart-db
//!
//! SQLite data-access layer for MartKit. Owns the connection pool and
//! the schema bootstrap; hands out explicit transaction scopes that the
//! workflow crates thread through their multi-statement sequences.

pub mod db;
pub mod error;
pub mod schema;

pub use db::{decode_ts, encode_ts, Db};
pub use error::{is_unique_violation, DbError};
