//! Process spawning on `tokio::process`.

use super::{CommandOutput, CommandRunner, Invocation};
use std::io;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

/// Time allowed for a killed process to be reaped after a timeout
const KILL_GRACE: Duration = Duration::from_secs(10);

/// [`CommandRunner`] that spawns real processes.
///
/// Stdout and stderr are both captured; stdout lines are also echoed at debug
/// level as they arrive, since `sam package` uploads can run for minutes.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner {
    timeout: Option<Duration>,
}

impl SystemCommandRunner {
    /// Creates a runner without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills and fails any command still running after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

impl CommandRunner for SystemCommandRunner {
    async fn run(&self, invocation: &Invocation) -> io::Result<CommandOutput> {
        log::debug!("Running: {invocation}");

        let mut child = Command::new(invocation.program())
            .args(invocation.get_args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| io::Error::new(e.kind(), format!("failed to spawn {invocation}: {e}")))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both streams must be drained before waiting, or a full pipe stalls the child.
        let drain = async {
            tokio::join!(
                capture_lines(stdout, "stdout", true),
                capture_lines(stderr, "stderr", false)
            )
        };

        let finished = async {
            let (stdout_lines, stderr_lines) = drain.await;
            let status = child.wait().await?;
            Ok::<_, io::Error>((status, stdout_lines, stderr_lines))
        };

        let (status, stdout_lines, stderr_lines) = match self.timeout {
            None => finished.await?,
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, finished).await;
                let Ok(result) = outcome else {
                    log::warn!(
                        "{} timed out after {} seconds, terminating...",
                        invocation.program(),
                        limit.as_secs()
                    );
                    if let Err(e) = child.start_kill() {
                        log::warn!("Failed to kill {}: {e}", invocation.program());
                    }
                    let _ = tokio::time::timeout(KILL_GRACE, child.wait()).await;

                    return Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        format!("{invocation} timed out after {} seconds", limit.as_secs()),
                    ));
                };
                result?
            }
        };

        Ok(CommandOutput {
            status_code: status.code(),
            stdout: stdout_lines.join("\n"),
            stderr: stderr_lines.join("\n"),
        })
    }
}

/// Reads `stream` to the end as lines, decoding invalid UTF-8 lossily.
///
/// A read error ends capture early and is logged; the child keeps running.
async fn capture_lines<R: AsyncRead + Unpin>(
    stream: Option<R>,
    name: &str,
    echo: bool,
) -> Vec<String> {
    let mut captured = Vec::new();
    let Some(stream) = stream else {
        return captured;
    };

    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\n', '\r']).to_string();
                if echo {
                    log::debug!("  {line}");
                }
                captured.push(line);
            }
            Err(e) => {
                log::warn!("Failed to read {name}: {e}");
                break;
            }
        }
    }
    captured
}
