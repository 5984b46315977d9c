//! CLI argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "certsync")]
#[command(version)]
#[command(
    about = "Upload a TLS certificate to cloud certificate managers and put it in service",
    long_about = None
)]
pub struct Cli {
    /// Options file (JSON, or TOML with a .toml extension)
    #[arg(long = "conf", value_name = "FILE", default_value = "config.json")]
    pub conf: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Print the run result as JSON instead of status lines
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Log filter used when RUST_LOG is unset
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}
