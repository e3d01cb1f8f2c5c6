//! Forced termination of a supervised child and, best-effort, its descendants.

use tokio::process::Child;

/// What: Kill a child that overstayed its timeout or was cancelled.
///
/// Inputs:
/// - `child`: Running child process.
/// - `own_group`: Whether the child leads its own process group (capture mode
///   on Unix), in which case the whole group is signalled.
///
/// Details:
/// - Unix: `SIGKILL` to the process group when `own_group`, then the child.
/// - Windows: `taskkill /T /F` for the tree, then the child.
/// - Always reaps the child so no zombie is left behind.
pub(super) async fn terminate(child: &mut Child, own_group: bool) {
    let pid = child.id();
    tracing::debug!(?pid, own_group, "[Exec] Terminating child");

    #[cfg(unix)]
    if own_group && let Some(pid) = pid {
        kill_group(pid);
    }

    #[cfg(windows)]
    if let Some(pid) = pid {
        kill_tree_windows(pid).await;
    }

    #[cfg(not(unix))]
    let _ = own_group;

    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "[Exec] start_kill failed (child likely gone)");
    }
    if let Err(e) = child.wait().await {
        tracing::warn!(error = %e, "[Exec] Failed to reap terminated child");
    }
}

/// Send `SIGKILL` to every process in the group led by `pid`.
#[cfg(unix)]
fn kill_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        tracing::debug!(pid, error = %e, "[Exec] killpg failed");
    }
}

/// Kill the process tree rooted at `pid` with `taskkill`.
#[cfg(windows)]
async fn kill_tree_windows(pid: u32) {
    let status = tokio::process::Command::new("taskkill")
        .args(["/T", "/F", "/PID", &pid.to_string()])
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .await;
    if let Err(e) = status {
        tracing::debug!(pid, error = %e, "[Exec] taskkill failed");
    }
}
