mod bearer;
mod error;
mod handler;
mod router;
mod validation;

pub use error::recover_error;
pub use router::routes;
