pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateVersionCommand, CreateVersionError};
pub use routes::versions_routes;
