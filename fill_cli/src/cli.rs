//! CLI argument definitions.

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "fill_cli", version, about = "Filling control subsystem")]
pub struct Cli {
    /// Path to the persisted configuration INI file.
    #[arg(long, value_name = "FILE", default_value = "filler.ini")]
    pub config: PathBuf,

    /// Product section name within the configuration file.
    #[arg(long, default_value = "PRODUCT1")]
    pub product: String,

    /// Run against a simulated shadow instead of the serial device.
    #[arg(long)]
    pub simulate: bool,

    /// Run the (out-of-core) UI non-fullscreen. Accepted for completeness;
    /// this build hosts no display surface.
    #[arg(long)]
    pub windowed: bool,

    /// Console log level (error|warn|info|debug|trace).
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit structured JSON log lines instead of pretty text.
    #[arg(long)]
    pub json: bool,
}
