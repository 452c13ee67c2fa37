pub mod auth;
pub mod error;
pub mod handlers;
pub mod signup;
pub mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use auth::*;
pub use error::*;
pub use handlers::*;
pub use signup::*;
pub use types::*;
pub use validation::*;
