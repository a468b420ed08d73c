//! Todos — wire model, service and REST routes.

pub mod convert;
pub mod model;
pub mod routes;
pub mod service;

pub use routes::todo_routes;
pub use service::TodoService;
