pub mod create;
pub mod run;

pub use create::{CreateJobCommand, CreateJobError};
pub use run::{RunJobError, RunJobResponse};
