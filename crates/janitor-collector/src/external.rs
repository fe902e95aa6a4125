//! Operator-declared external commands
//!
//! A command prints a JSON array of image references on stdout and exits
//! zero. Anything else (non-zero exit, timeout, bad payload) aborts the run.

use janitor_core::config::ExternalCommand;
use janitor_core::{CancelToken, Error, ImageReference, LiveImageTable, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

/// Time between SIGTERM and SIGKILL
pub const KILL_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Runs external commands and collects the references they print
pub struct ExternalScanner {
    cancel: CancelToken,
}

impl ExternalScanner {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    pub async fn scan(&self, commands: &[ExternalCommand]) -> Result<LiveImageTable> {
        let mut live = LiveImageTable::new();
        for command in commands {
            let output = self.run(command).await?;
            let consumer = format!("external_command: {}", command.display());
            for reference in parse_references(&command.display(), &output)? {
                if live.add(reference.clone(), consumer.clone()) {
                    info!("Image {} is in use by {}", reference, consumer);
                }
            }
        }
        Ok(live)
    }

    /// Run one command and return its stdout
    pub async fn run(&self, command: &ExternalCommand) -> Result<Vec<u8>> {
        info!("Scanning by external command: {:?}", command.command);
        self.cancel.check()?;

        let cmd_display = command.display();
        let mut cmd = Command::new(&command.command[0]);
        cmd.args(&command.command[1..])
            .envs(&command.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = &command.dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::command_failed(&cmd_display, format!("failed to start: {}", e)))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::command_failed(&cmd_display, "stdout was not captured"))?;
        // drain stdout while waiting so a chatty child never blocks on a full pipe
        let reader = tokio::spawn(async move {
            let mut buf = Vec::new();
            stdout.read_to_end(&mut buf).await.map(|_| buf)
        });

        let timeout = async {
            match command.timeout {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };

        let status = tokio::select! {
            status = child.wait() => status?,
            _ = timeout => {
                terminate(&mut child, &cmd_display).await;
                return Err(Error::timeout(cmd_display, command.timeout.unwrap_or_default()));
            }
            _ = self.cancel.cancelled() => {
                terminate(&mut child, &cmd_display).await;
                return Err(Error::Cancelled);
            }
        };

        if !status.success() {
            return Err(Error::command_failed(cmd_display, describe_status(status)));
        }
        let output = reader
            .await
            .map_err(|e| Error::command_failed(&cmd_display, format!("stdout reader failed: {}", e)))??;
        debug!("External command {} printed {} bytes", cmd_display, output.len());
        Ok(output)
    }
}

/// SIGTERM, then SIGKILL once the grace period runs out
async fn terminate(child: &mut Child, cmd_display: &str) {
    let Some(pid) = child.id() else {
        // already reaped
        return;
    };
    warn!("Terminating external command {} (pid {})", cmd_display, pid);
    let Ok(raw_pid) = i32::try_from(pid) else {
        let _ = child.kill().await;
        return;
    };
    if kill(Pid::from_raw(raw_pid), Signal::SIGTERM).is_err() {
        let _ = child.kill().await;
        return;
    }
    if tokio::time::timeout(KILL_GRACE_PERIOD, child.wait())
        .await
        .is_err()
    {
        warn!("External command {} ignored SIGTERM, killing", cmd_display);
        let _ = child.kill().await;
    }
}

fn describe_status(status: ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Decode the JSON array printed by an external command
pub fn parse_references(command: &str, output: &[u8]) -> Result<Vec<ImageReference>> {
    let references: Vec<String> = serde_json::from_slice(output).map_err(|e| {
        Error::command_failed(command, format!("output is not a JSON array of strings: {}", e))
    })?;
    Ok(references
        .into_iter()
        .filter(|r| !r.is_empty())
        .map(ImageReference::new)
        .collect())
}
