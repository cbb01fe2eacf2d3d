use domain::outcome::ShellOutput;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::Command;

/// Exit code reported when a command is killed for exceeding its time limit.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Runs commands through the host shell and captures both output streams.
#[derive(Debug, Clone, Default)]
pub struct ShellBackend {
    timeout: Option<Duration>,
}

impl ShellBackend {
    /// `None` waits for the command indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Never fails: launch errors and timeouts come back as a non-zero exit
    /// code with the reason on stderr.
    pub async fn run(&self, command: &str) -> ShellOutput {
        tracing::info!(command, "executing command");

        let mut shell = host_shell(command);
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            shell.process_group(0);
        }
        let mut cmd = Command::from(shell);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                tracing::error!(command, %err, "failed to launch shell");
                return ShellOutput::launch_failure(format!("Failed to launch shell: {err}"));
            }
        };

        // The shell leads its own group, so its pid is also the group id.
        let pgid = child.id();

        // Dropping the pending wait on timeout kills the child (kill_on_drop).
        let waited = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait_with_output()).await {
                Ok(waited) => waited,
                Err(_) => {
                    tracing::warn!(command, timeout_secs = limit.as_secs_f64(), "command timed out");
                    if let Some(pgid) = pgid {
                        kill_process_group(pgid).await;
                    }
                    return ShellOutput {
                        stdout: String::new(),
                        stderr: format!("Command timed out after {:.1}s", limit.as_secs_f64()),
                        exit_code: TIMEOUT_EXIT_CODE,
                    };
                }
            },
            None => child.wait_with_output().await,
        };

        match waited {
            Ok(output) => {
                let exit_code = exit_code(output.status);
                tracing::info!(exit_code, "command completed");
                ShellOutput {
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                }
            }
            Err(err) => {
                tracing::error!(command, %err, "error waiting for command");
                ShellOutput::launch_failure(err.to_string())
            }
        }
    }
}

fn host_shell(command: &str) -> std::process::Command {
    if cfg!(target_os = "windows") {
        let mut c = std::process::Command::new("cmd");
        c.args(["/C", command]);
        c
    } else {
        let mut c = std::process::Command::new("sh");
        c.args(["-c", command]);
        c
    }
}

/// Background jobs and pipeline members share the shell's group and would
/// otherwise outlive it.
#[cfg(unix)]
async fn kill_process_group(pgid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pgid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;
    match status {
        Ok(status) if status.success() => tracing::debug!(pgid, "killed process group"),
        Ok(status) => tracing::warn!(pgid, %status, "could not kill process group"),
        Err(err) => tracing::warn!(pgid, %err, "could not kill process group"),
    }
}

#[cfg(not(unix))]
async fn kill_process_group(_pgid: u32) {}

/// Signal-terminated processes report the negated signal number.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return -signal;
        }
    }
    1
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let out = ShellBackend::default().run("echo hello").await;
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "");
        assert_eq!(out.exit_code, 0);
    }

    #[tokio::test]
    async fn captures_stderr_and_failure_code() {
        let out = ShellBackend::default().run("echo oops >&2; exit 3").await;
        assert_eq!(out.stdout, "");
        assert_eq!(out.stderr, "oops\n");
        assert_eq!(out.exit_code, 3);
    }

    #[tokio::test]
    async fn empty_command_is_a_successful_no_op() {
        let out = ShellBackend::default().run("").await;
        assert_eq!(out.exit_code, 0);
        assert!(out.stdout.is_empty());
    }

    #[tokio::test]
    async fn missing_program_reports_shell_exit_code() {
        let out = ShellBackend::default()
            .run("definitely-not-a-real-program-xyz")
            .await;
        assert_eq!(out.exit_code, 127);
        assert!(!out.stderr.is_empty());
    }

    #[tokio::test]
    async fn slow_command_is_killed_at_timeout() {
        let backend = ShellBackend::new(Some(Duration::from_millis(200)));
        let started = std::time::Instant::now();
        let out = backend.run("sleep 5").await;
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);
        assert!(out.stderr.contains("timed out"));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn timeout_also_kills_background_jobs() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("survivor");
        let backend = ShellBackend::new(Some(Duration::from_millis(200)));

        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let out = backend.run(&script).await;
        assert_eq!(out.exit_code, TIMEOUT_EXIT_CODE);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
