//! todo-list — CRUD backend for a single todo entity.

pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod todos;
