pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{AddSourceCommand, AddSourceError};
pub use routes::sources_routes;
