pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{AddLabelCommand, AddLabelError, AutoLabelResponse};
pub use routes::labels_routes;
