mod auth_service_impl;
mod credential_hasher_impl;
mod token_codec_impl;

pub use auth_service_impl::*;
pub use credential_hasher_impl::*;
pub use token_codec_impl::*;
