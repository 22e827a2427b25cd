use std::path::PathBuf;

use ttv_core::Config;

use crate::worker::Worker;

#[derive(Clone, Debug, clap::Args)]
pub struct ProcessArg {
    /// Package files, processed in the given order.
    #[arg(required = true)]
    pub packages: Vec<PathBuf>,
}

impl ProcessArg {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut worker = Worker::start(config)?;
        let summary = worker.process(self.packages);
        summary.report();
        Ok(())
    }
}
