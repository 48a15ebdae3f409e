use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::{Executor, OutputLine, ProcessEvent, ProcessHandle, Stream};

/// Runs processes on the local machine.
///
/// Each process is placed in its own process group so that [`Executor::kill`]
/// also reaches any children it started.
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    running: Arc<Mutex<HashMap<u32, CancellationToken>>>,
}

impl LocalExecutor {
    /// Creates a new [`LocalExecutor`].
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn running(&self) -> MutexGuard<'_, HashMap<u32, CancellationToken>> {
        self.running.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn spawn(&self, command: Command) -> Result<ProcessHandle> {
        let program = PathBuf::from(command.get_program());
        tracing::debug!(
            program = ?program,
            args = ?command.get_args().collect::<Vec<_>>(),
            cwd = ?command.get_current_dir(),
            "spawning process"
        );

        let mut command = tokio::process::Command::from(command);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;
        let pid = child.id().ok_or(Error::MissingPid(program))?;

        let (tx, rx) = mpsc::unbounded_channel();
        let readers = [
            child
                .stdout
                .take()
                .map(|s| tokio::spawn(forward_lines(s, Stream::Stdout, tx.clone()))),
            child
                .stderr
                .take()
                .map(|s| tokio::spawn(forward_lines(s, Stream::Stderr, tx.clone()))),
        ];

        let kill = CancellationToken::new();
        self.running().insert(pid, kill.clone());
        let running = self.running.clone();

        tokio::spawn(async move {
            let status = tokio::select! {
                status = child.wait() => status,
                _ = kill.cancelled() => {
                    if let Err(e) = child.start_kill() {
                        tracing::debug!(pid, error = %e, "child already gone");
                    }
                    child.wait().await
                }
            };
            for reader in readers.into_iter().flatten() {
                let _ = reader.await;
            }
            running
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .remove(&pid);

            let code = match status {
                Ok(status) => status.code().unwrap_or(-1),
                Err(e) => {
                    tracing::error!(pid, error = %e, "failed to wait for process");
                    -1
                }
            };
            tracing::debug!(pid, code, "process exited");
            let _ = tx.send(ProcessEvent::Exited { code });
        });

        Ok(ProcessHandle::new(pid, rx))
    }

    async fn kill(&self, pid: u32) -> Result<()> {
        let Some(token) = self.running().get(&pid).cloned() else {
            tracing::debug!(pid, "process already exited");
            return Ok(());
        };

        #[cfg(unix)]
        {
            let status = tokio::process::Command::new("kill")
                .arg("-KILL")
                .arg("--")
                .arg(format!("-{pid}"))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .map_err(|source| Error::Kill { pid, source })?;
            if !status.success() {
                tracing::warn!(pid, "failed to signal process group");
            }
        }

        token.cancel();
        Ok(())
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(
    reader: R,
    stream: Stream,
    tx: mpsc::UnboundedSender<ProcessEvent>,
) {
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                // Keep draining after the receiver is gone so the child never blocks on a full pipe.
                let _ = tx.send(ProcessEvent::Output(OutputLine { stream, text }));
            }
            Err(e) => {
                tracing::warn!(?stream, error = %e, "failed to read process output");
                break;
            }
        }
    }
}
