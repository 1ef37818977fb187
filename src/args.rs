use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
pub struct LegendsAuthArgs {
    /// Path to the server configuration file.
    #[arg(long, default_value = "config.toml")]
    pub config: PathBuf,
}
