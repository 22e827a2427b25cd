mod cli;
mod worker;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::App;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let app = App::parse();
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), config = %app.config.display(), "starting ttv");
    app.run()
}
