mod auth_service;
mod call_context;

pub use auth_service::*;
pub use call_context::*;
