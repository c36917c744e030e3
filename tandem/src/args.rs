use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

/// Tandem strong/weak model router
#[derive(Debug, Parser)]
#[command(
    name = "tandem",
    about = "OpenAI-compatible router that sends each prompt to a strong or a weak model"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "tandem.toml", env = "TANDEM_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "TANDEM_LISTEN")]
    pub listen: Option<SocketAddr>,

    /// Log filter directives (e.g. "info,tandem_routing=debug")
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    pub log: String,
}
