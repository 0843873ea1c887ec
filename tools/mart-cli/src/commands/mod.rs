//! CLI command implementations.

pub mod bank;
pub mod init;
pub mod shop;

use clap::Args;

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Skip loading the demo catalog and branch directory.
    #[arg(long)]
    pub no_demo: bool,
}
