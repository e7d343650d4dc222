use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Child;
use tracing::{debug, instrument, warn};
use uiact_core_types::{ActionRequest, ExecMode};

use crate::errors::ExecError;
use crate::model::{ChildLine, DriverReport, ExecCtx, StrategyCfg};
use crate::ports::{DriverFault, ProcessLauncher};
use crate::ExecutionStrategy;

/// Runs the driver inside a dedicated child process. On deadline expiry (or
/// caller cancellation) the child is asked to terminate, given a grace
/// period, then killed and reaped. A blocked synchronous call inside the
/// child cannot escape the OS, which is the recovery guarantee the other
/// strategies lack.
pub struct ProcessIsolatedStrategy {
    launcher: Arc<dyn ProcessLauncher>,
    cfg: StrategyCfg,
}

impl ProcessIsolatedStrategy {
    pub fn new(launcher: Arc<dyn ProcessLauncher>, cfg: StrategyCfg) -> Self {
        Self { launcher, cfg }
    }

    /// Graceful termination, grace period, then hard kill. Always reaps.
    async fn reclaim(&self, child: &mut Child) {
        terminate_gracefully(child);
        match tokio::time::timeout(self.cfg.grace, child.wait()).await {
            Ok(Ok(status)) => {
                debug!(%status, "child exited within grace period");
                return;
            }
            Ok(Err(err)) => warn!(?err, "waiting for child after terminate failed"),
            Err(_) => debug!("grace period expired; killing child"),
        }
        if let Err(err) = child.kill().await {
            warn!(?err, "failed to kill child driver");
        }
    }
}

#[async_trait]
impl ExecutionStrategy for ProcessIsolatedStrategy {
    fn mode(&self) -> ExecMode {
        ExecMode::Subprocess
    }

    #[instrument(skip_all, fields(action = %ctx.action_id.0, driver = self.launcher.name()))]
    async fn execute(
        &self,
        ctx: &ExecCtx,
        request: &ActionRequest,
    ) -> Result<DriverReport, ExecError> {
        let mut child = self
            .launcher
            .spawn(request)
            .map_err(|err| DriverFault::Unavailable(format!("spawn failed: {err}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ExecError::Protocol("child stdout not piped".into()))?;
        let mut lines = BufReader::new(stdout).lines();

        let started = Instant::now();
        let line = tokio::select! {
            _ = ctx.cancel.cancelled() => {
                self.reclaim(&mut child).await;
                return Err(ExecError::Cancelled);
            }
            read = tokio::time::timeout(ctx.timeout, lines.next_line()) => match read {
                Err(_) => {
                    warn!(waited = ?started.elapsed(), "child deadline expired; reclaiming");
                    self.reclaim(&mut child).await;
                    return Err(ExecError::Timeout { waited: ctx.timeout });
                }
                Ok(Err(err)) => {
                    self.reclaim(&mut child).await;
                    return Err(ExecError::Protocol(format!("reading child stdout: {err}")));
                }
                Ok(Ok(line)) => line,
            },
        };

        let report = match line {
            Some(raw) => parse_report(&raw),
            None => {
                // EOF without a report line: the child died on its own
                let status = tokio::time::timeout(self.cfg.grace, child.wait())
                    .await
                    .map_err(|_| ExecError::Protocol("child held open after EOF".into()))?
                    .map_err(ExecError::Spawn)?;
                return Err(DriverFault::Unavailable(format!(
                    "child exited without report ({status})"
                ))
                .into());
            }
        };

        // the report line is the handshake; the child should now exit
        match tokio::time::timeout(self.cfg.grace, child.wait()).await {
            Ok(Ok(status)) => debug!(%status, "child driver exited"),
            Ok(Err(err)) => warn!(?err, "failed to reap child driver"),
            Err(_) => {
                warn!("child lingered after reporting; reclaiming");
                self.reclaim(&mut child).await;
            }
        }
        report
    }
}

#[cfg(unix)]
fn terminate_gracefully(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            debug!(?err, pid, "SIGTERM delivery failed");
        }
    }
}

#[cfg(not(unix))]
fn terminate_gracefully(_child: &Child) {}

fn parse_report(raw: &str) -> Result<DriverReport, ExecError> {
    let line: ChildLine = serde_json::from_str(raw)
        .map_err(|err| ExecError::Protocol(format!("bad report line: {err}")))?;
    if line.ok {
        Ok(DriverReport {
            state: line.state,
            note: line.note,
        })
    } else {
        let detail = line.error.unwrap_or_else(|| "unspecified".into());
        Err(DriverFault::Faulted(detail).into())
    }
}
