//! Settings are read once at startup from a TOML file, chosen with `--settings`.
//! Secrets are not stored here; the file only names the environment variables
//! that hold them.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
