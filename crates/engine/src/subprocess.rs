//! Subprocess execution for the engine bridge.
//!
//! [`run_command`] drives the child with `tokio::process`: stdout and
//! stderr are drained on their own tasks and the child is killed if the
//! future is dropped. Renders are invoked from the dispatcher's blocking
//! threads, so [`run_command_blocking`] blocks on the surrounding runtime
//! (or a private current-thread runtime outside of one).

use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::runtime::{Builder, Handle};

/// Maximum stdout or stderr size captured per stream (1 MiB).
///
/// Anything beyond the cap is read and discarded so the child never
/// blocks on a full pipe.
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Captured result of a finished child process.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Spawn `cmd`, write `input` to its stdin, wait for exit and capture both
/// output streams.
///
/// Returns the spawn error unchanged so callers can classify it.
pub async fn run_command(cmd: &mut Command, input: &[u8]) -> io::Result<CommandOutput> {
    // `kill_on_drop(true)` kills the child if this future is abandoned.
    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    if let Some(mut stdin) = child.stdin.take() {
        // The child may exit without reading its input.
        let _ = stdin.write_all(input).await;
        drop(stdin);
    }

    let status = child.wait().await?;
    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    Ok(CommandOutput {
        status,
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        duration: start.elapsed(),
    })
}

/// [`run_command`] for synchronous callers.
///
/// Must not be called from inside an async task; the render path calls it
/// from `spawn_blocking` threads.
pub fn run_command_blocking(cmd: &mut Command, input: &[u8]) -> io::Result<CommandOutput> {
    match Handle::try_current() {
        Ok(handle) => handle.block_on(run_command(cmd, input)),
        Err(_) => Builder::new_current_thread()
            .enable_all()
            .build()?
            .block_on(run_command(cmd, input)),
    }
}

/// Read a stream up to [`MAX_OUTPUT_BYTES`], discarding the remainder.
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(mut h) = handle {
        let _ = (&mut h).take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
        let _ = tokio::io::copy(&mut h, &mut tokio::io::sink()).await;
    }
    buf
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn bash(script: &str) -> Command {
        let mut cmd = Command::new("bash");
        cmd.args(["-c", script]);
        cmd
    }

    #[tokio::test]
    async fn echoes_stdin() {
        let out = run_command(&mut bash("cat"), b"{\"key\":1}").await.expect("run");
        assert!(out.status.success());
        assert_eq!(out.stdout, "{\"key\":1}");
    }

    #[tokio::test]
    async fn captures_stderr_and_exit_code() {
        let out = run_command(&mut bash("echo oops >&2; exit 7"), b"").await.expect("run");
        assert_eq!(out.status.code(), Some(7));
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn child_ignoring_stdin_does_not_hang() {
        let big = vec![b'x'; 4 * 1024 * 1024];
        let out = run_command(&mut bash("exit 0"), &big).await.expect("run");
        assert!(out.status.success());
    }

    #[tokio::test]
    async fn output_is_capped() {
        let script = "head -c 3000000 /dev/zero | tr '\\0' 'a'";
        let out = run_command(&mut bash(script), b"").await.expect("run");
        assert!(out.status.success());
        assert_eq!(out.stdout.len() as u64, MAX_OUTPUT_BYTES);
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let mut cmd = Command::new("/definitely/not/a/program");
        let err = run_command(&mut cmd, b"").await.expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn dropped_run_kills_child() {
        let dir = tempfile::tempdir().expect("tempdir");
        let marker = dir.path().join("finished");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let mut cmd = bash(&script);
        let timed_out = tokio::time::timeout(Duration::from_millis(100), run_command(&mut cmd, b""))
            .await
            .is_err();
        assert!(timed_out);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "child outlived the dropped run");
    }

    #[test]
    fn blocking_without_runtime() {
        let out = run_command_blocking(&mut bash("echo ready"), b"").expect("run");
        assert_eq!(out.stdout.trim(), "ready");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn blocking_on_runtime_blocking_thread() {
        let out = tokio::task::spawn_blocking(|| run_command_blocking(&mut bash("cat"), b"ping"))
            .await
            .expect("join")
            .expect("run");
        assert_eq!(out.stdout, "ping");
    }
}
