pub mod commands;
pub mod queries;
pub mod routes;

pub use commands::{AddAssetsCommand, AddAssetsError};
pub use routes::assets_routes;
