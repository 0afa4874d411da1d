//! Process-local adapters, used by the "fake" backends and by tests.

mod refresh_token_store_memory;
mod user_repo_memory;

pub use refresh_token_store_memory::*;
pub use user_repo_memory::*;
