//! Persistence layer — libSQL-backed storage for todos.

pub mod filter;
pub mod libsql_backend;
pub mod migrations;
pub mod traits;

pub use libsql_backend::LibSqlBackend;
pub use traits::{TodoField, TodoRecord, TodoRepository};
