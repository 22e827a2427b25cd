use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use anyhow::Context;
use ttv_core::{
    BatchRotator, BatchWorkspace, CatalogResolver, Config, Quarantine, TaskOutcome,
    TransferContext, TransferTask, WorkspaceLock,
};
use ttv_vault::{ReqwestVaultClient, TarCommand, VaultDispatcher};

type Dispatcher = VaultDispatcher<TarCommand, ReqwestVaultClient>;

/// The single owner of the batch workspace for the lifetime of the process.
pub struct Worker {
    ctx:   TransferContext<CatalogResolver, Dispatcher>,
    _lock: WorkspaceLock,
}

impl Worker {
    pub fn start(config: &Config) -> anyhow::Result<Self> {
        let resolver = CatalogResolver::load(&config.catalog)?;

        let archiver = config.archiver.env.iter().fold(
            TarCommand::new(&config.archiver.program, &config.archiver.target_root)
                .timeout(config.archiver.timeout()),
            |archiver, (key, value)| archiver.env(key, value),
        );
        let vault = ReqwestVaultClient::new(&config.vault.url, config.vault.timeout())?;
        let dispatcher = VaultDispatcher::new(archiver, vault, config.vault.single_object);

        let lock = BatchWorkspace::lock_root(&config.batch.current)
            .context("another worker owns the batch workspace")?;
        let workspace = BatchWorkspace::open(&config.batch.current)?;
        let rotator = BatchRotator::new(workspace, config.batch.threshold, &config.batch.outbox, dispatcher)?;
        let quarantine = Quarantine::new(&config.batch.rejects);

        tracing::info!(
            current = %config.batch.current.display(),
            outbox = %config.batch.outbox.display(),
            threshold = config.batch.threshold,
            "worker started"
        );
        Ok(Self {
            ctx:   TransferContext::new(resolver, rotator, quarantine),
            _lock: lock,
        })
    }

    pub fn process(&mut self, packages: impl IntoIterator<Item = PathBuf>) -> Summary {
        let mut summary = Summary::default();
        for package in packages {
            let outcome = TransferTask::new(package).run(&mut self.ctx);
            summary.record(&outcome);
        }
        summary
    }
}

#[derive(Debug, Default)]
pub struct Summary {
    total:    usize,
    outcomes: BTreeMap<&'static str, usize>,
}

impl Summary {
    pub fn record(&mut self, outcome: &TaskOutcome) {
        self.total += 1;
        *self.outcomes.entry(outcome.label()).or_default() += 1;
    }

    pub fn report(&self) {
        tracing::info!(total = self.total, "{self}");
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "processed {} package(s)", self.total)?;
        for (i, (label, count)) in self.outcomes.iter().enumerate() {
            let sep = if i == 0 { ": " } else { ", " };
            write!(f, "{sep}{count} {label}")?;
        }
        Ok(())
    }
}
