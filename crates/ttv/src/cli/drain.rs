use std::path::{Path, PathBuf};

use anyhow::Context;
use ttv_core::Config;

use crate::worker::Worker;

#[derive(Clone, Debug, clap::Args)]
pub struct DrainArg {}

impl DrainArg {
    pub fn run(self, config: &Config) -> anyhow::Result<()> {
        let mut worker = Worker::start(config)?;
        let mut packages = Vec::new();
        for inbox in &config.inboxes {
            let found = list_packages(&inbox.path)
                .with_context(|| format!("listing inbox '{}' at {}", inbox.name, inbox.path.display()))?;
            tracing::info!(inbox = %inbox.name, packages = found.len(), "draining inbox");
            packages.extend(found);
        }
        worker.process(packages).report();
        Ok(())
    }
}

/// `*.zip` files directly in `inbox`, sorted by name.
fn list_packages(inbox: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut packages = Vec::new();
    for entry in std::fs::read_dir(inbox)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().is_some_and(|ext| ext == "zip") {
            packages.push(path);
        }
    }
    packages.sort();
    Ok(packages)
}
