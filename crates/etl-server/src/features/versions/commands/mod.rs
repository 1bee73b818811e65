pub mod create;

pub use create::{CreateVersionCommand, CreateVersionError};
