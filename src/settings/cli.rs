use super::Parser;

#[derive(Parser, Debug)]
#[command(about = "Authentication and session rotation service")]
pub struct Cli {
    /// Path to a settings TOML file.
    #[arg(long)]
    pub settings: Option<String>,
}
