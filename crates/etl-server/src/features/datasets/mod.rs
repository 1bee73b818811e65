pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateDatasetCommand, CreateDatasetError};
pub use queries::GetDatasetError;
pub use routes::datasets_routes;
