pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{CreateJobCommand, RunJobResponse};
pub use routes::jobs_routes;
