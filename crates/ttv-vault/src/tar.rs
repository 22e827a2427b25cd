use std::path::Path;
use std::time::Duration;

use crate::command::Command;
use crate::error::{Error, Result};

/// Packs a sealed batch directory into a durable archive artifact.
pub trait Archiver {
    /// Archive `batch` and return the location of the produced artifact.
    fn archive(&self, batch: &Path) -> Result<String>;
}

/// `dmftar`-compatible archiver: `<program> -c -f <target> <batch>`.
#[derive(Clone, Debug)]
pub struct TarCommand {
    program: String,
    target_root: String,
    timeout: Option<Duration>,
    env: Vec<(String, String)>,
}

impl TarCommand {
    pub fn new(program: impl Into<String>, target_root: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            target_root: target_root.into(),
            timeout: None,
            env: Vec::new(),
        }
    }

    /// Extra environment for the archive program, e.g. credentials for the
    /// tape host.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Artifact location for `batch`: the target root followed by the batch
    /// directory name and a `.dmftar` extension.
    pub fn target_for(&self, batch: &Path) -> Result<String> {
        let name = batch
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::InvalidBatch(batch.to_path_buf()))?;
        Ok(format!("{}{name}.dmftar", self.target_root))
    }

    pub fn command(&self, batch: &Path, target: &str) -> Command {
        let command = Command::new(&self.program)
            .args(["-c", "-f", target])
            .arg(batch);
        self.env
            .iter()
            .fold(command, |command, (key, value)| command.env(key, value))
    }
}

impl Archiver for TarCommand {
    fn archive(&self, batch: &Path) -> Result<String> {
        let target = self.target_for(batch)?;
        let command = self.command(batch, &target);
        tracing::info!(command = %command.display(), "archiving batch");
        command.run(self.timeout)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;

    #[test]
    fn target_uses_batch_name() {
        let tar = TarCommand::new("dmftar", "archive@tape:/vault/");
        let target = tar.target_for(Path::new("/outbox/batch-1700000000000")).unwrap();
        assert_eq!(target, "archive@tape:/vault/batch-1700000000000.dmftar");
    }

    #[test]
    fn target_rejects_nameless_batch() {
        let tar = TarCommand::new("dmftar", "/vault/");
        assert!(matches!(tar.target_for(Path::new("/")), Err(Error::InvalidBatch(_))));
    }

    #[test]
    fn command_layout() {
        let tar = TarCommand::new("dmftar", "/vault/");
        let cmd = tar.command(Path::new("/outbox/batch-1"), "/vault/batch-1.dmftar");
        assert_eq!(cmd.display(), "dmftar -c -f /vault/batch-1.dmftar /outbox/batch-1");
    }

    #[test]
    fn command_carries_configured_env() {
        let tar = TarCommand::new("dmftar", "/vault/").env("DMFTAR_HOST", "tape01");
        let cmd = tar.command(Path::new("/outbox/batch-1"), "/vault/batch-1.dmftar");
        let envs: Vec<_> = cmd.inner.get_envs().collect();
        assert_eq!(envs, vec![(OsStr::new("DMFTAR_HOST"), Some(OsStr::new("tape01")))]);
    }

    #[cfg(unix)]
    #[test]
    fn archive_returns_target_on_success() {
        let tar = TarCommand::new("true", "/vault/");
        let target = tar.archive(Path::new("/outbox/batch-7")).unwrap();
        assert_eq!(target, "/vault/batch-7.dmftar");
    }

    #[cfg(unix)]
    #[test]
    fn archive_fails_on_nonzero_exit() {
        let tar = TarCommand::new("false", "/vault/");
        let result = tar.archive(Path::new("/outbox/batch-7"));
        assert!(matches!(result, Err(Error::CommandExit { .. })));
    }
}
