mod check;
mod drain;
mod process;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use ttv_core::Config;

pub use check::CheckArg;
pub use drain::DrainArg;
pub use process::ProcessArg;

#[derive(Clone, Debug, Parser)]
#[command(name = "ttv", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    /// Configuration file; `TTV_*` environment variables override it.
    #[arg(short, long, global = true, default_value = "/etc/opt/ttv/config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "p", name = "process", about = "Transfer the given packages")]
    Process(ProcessArg),
    #[command(alias = "d", name = "drain", about = "Transfer every package waiting in the inboxes")]
    Drain(DrainArg),
    #[command(name = "check", about = "Validate and print the effective configuration")]
    Check(CheckArg),
}

impl App {
    pub fn run(self) -> anyhow::Result<()> {
        let config = Config::load(&self.config)
            .with_context(|| format!("loading configuration from {}", self.config.display()))?;
        match self.cmd {
            Commands::Process(arg) => arg.run(&config),
            Commands::Drain(arg) => arg.run(&config),
            Commands::Check(arg) => arg.run(&config),
        }
    }
}
