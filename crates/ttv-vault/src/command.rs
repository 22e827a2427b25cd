use std::ffi::OsStr;
use std::io::Read;
use std::process::{Child, Command as StdCommand, Output, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub struct Command {
    pub(crate) inner: StdCommand,
    program: String,
}

impl Command {
    pub fn new(program: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            inner: StdCommand::new(&program),
            program,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.inner.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.inner.args(args);
        self
    }

    pub fn env<K, V>(mut self, key: K, val: V) -> Self
    where
        K: AsRef<OsStr>,
        V: AsRef<OsStr>,
    {
        self.inner.env(key, val);
        self
    }

    pub fn program(&self) -> &str { &self.program }

    /// Human readable command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.clone())
            .chain(self.inner.get_args().map(|a| a.to_string_lossy().into_owned()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, killing the child once `timeout` has elapsed.
    ///
    /// A non-zero exit status is an error carrying the captured stderr.
    pub fn run(mut self, timeout: Option<Duration>) -> Result<Output> {
        let cmd = self.display();
        let mut child = self
            .inner
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::CommandFailed {
                cmd: cmd.clone(),
                source: e,
            })?;

        // drain both pipes so a chatty child cannot block on a full buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait(&mut child, timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    cmd,
                    after: timeout.unwrap_or_default(),
                });
            }
            Err(e) => return Err(Error::CommandFailed { cmd, source: e }),
        };

        let output = Output {
            status,
            stdout: join(stdout),
            stderr: join(stderr),
        };

        if !output.status.success() {
            return Err(Error::CommandExit {
                cmd,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

fn wait(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<std::process::ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_new() {
        let cmd = Command::new("dmftar");
        assert_eq!(cmd.program, "dmftar");
    }

    #[test]
    fn test_command_args() {
        let cmd = Command::new("dmftar").arg("-c").arg("-f");
        let args: Vec<_> = cmd.inner.get_args().collect();
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_command_display() {
        let cmd = Command::new("dmftar").args(["-c", "-f", "target.dmftar", "/outbox/batch-1"]);
        assert_eq!(cmd.display(), "dmftar -c -f target.dmftar /outbox/batch-1");
    }

    #[test]
    fn test_command_env() {
        let cmd = Command::new("echo").env("KEY", "value");
        assert!(cmd.inner.get_envs().count() > 0);
    }

    #[test]
    fn test_command_missing_program() {
        let result = Command::new("ttv_nonexistent_binary_12345").run(None);
        assert!(matches!(result, Err(Error::CommandFailed { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_captures_stdout() {
        let output = Command::new("sh").args(["-c", "echo archived"]).run(None).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "archived");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_nonzero_exit() {
        let result = Command::new("sh")
            .args(["-c", "echo broken tape >&2; exit 3"])
            .run(None);
        match result {
            Err(Error::CommandExit { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "broken tape");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout() {
        let result = Command::new("sleep")
            .arg("5")
            .run(Some(Duration::from_millis(100)));
        assert!(matches!(result, Err(Error::Timeout { .. })));
    }
}
