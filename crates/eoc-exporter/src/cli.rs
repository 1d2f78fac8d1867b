//! Clap derive structures for the `eoc-exporter` binary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// eoc-exporter -- Prometheus exporter for Triax EoC controllers
#[derive(Debug, Parser)]
#[command(
    name = "eoc-exporter",
    version,
    about = "Export metrics of Triax EoC controllers to Prometheus",
    long_about = "Polls Triax Ethernet-over-Coax controllers (firmware 2.x and 3.x)\n\
        and republishes their state in the Prometheus text format.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the configuration file
    #[arg(
        long,
        short = 'c',
        env = "EOC_EXPORTER_CONFIG",
        default_value = "config.toml",
        global = true
    )]
    pub config: PathBuf,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve metrics over HTTP
    Serve(ServeArgs),

    /// Collect one controller once and print its metrics
    Check(CheckArgs),
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Listen address (overrides `defaults.listen`)
    #[arg(long, short = 'l', env = "EOC_EXPORTER_LISTEN")]
    pub listen: Option<String>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Controller alias or host
    pub target: String,
}
