/* src/cli/core/src/dev/process.rs */

use std::path::Path;
use std::time::Duration;

use rola_engine::ServerProcessError;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use crate::ui::{CYAN, DIM, RESET};

const LABEL: &str = "server";

pub(super) struct ChildProcess {
  pub child: tokio::process::Child,
}

/// Run the compiled server bundle with `PORT` set.
pub(super) fn spawn_server(
  runtime: &str,
  bundle: &Path,
  base_dir: &Path,
  port: u16,
  env_vars: &[(String, String)],
) -> Result<ChildProcess, ServerProcessError> {
  if !bundle.is_file() {
    return Err(ServerProcessError::MissingBundle(bundle.to_path_buf()));
  }
  let mut cmd = Command::new(runtime);
  cmd.arg(bundle);
  cmd.current_dir(base_dir);
  cmd.stdout(std::process::Stdio::piped());
  cmd.stderr(std::process::Stdio::piped());
  cmd.kill_on_drop(true);
  for (key, val) in env_vars {
    cmd.env(key, val);
  }
  cmd.env("PORT", port.to_string());

  let child =
    cmd.spawn().map_err(|source| ServerProcessError::Spawn { bundle: bundle.to_path_buf(), source })?;
  Ok(ChildProcess { child })
}

/// Pipe stdout/stderr, prefixed with a colored label
pub(super) fn pipe_output(proc: &mut ChildProcess) {

  if let Some(stdout) = proc.child.stdout.take() {
    tokio::spawn(async move {
      let mut lines = BufReader::new(stdout).lines();
      while let Ok(Some(line)) = lines.next_line().await {
        println!("  {CYAN}{DIM}{LABEL:>8}{RESET} {line}");
      }
    });
  }

  if let Some(stderr) = proc.child.stderr.take() {
    tokio::spawn(async move {
      let mut lines = BufReader::new(stderr).lines();
      while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("  {CYAN}{DIM}{LABEL:>8}{RESET} {line}");
      }
    });
  }
}

/// SIGTERM, wait up to `grace`, then kill.
pub(super) async fn stop(proc: &mut ChildProcess, grace: Duration) {
  if let Ok(Some(_)) = proc.child.try_wait() {
    return;
  }
  if let Some(pid) = proc.child.id() {
    let _ = Command::new("kill").args(["-TERM", &pid.to_string()]).status().await;
  }
  if tokio::time::timeout(grace, proc.child.wait()).await.is_err() {
    tracing::debug!("{LABEL} ignored SIGTERM, killing");
    let _ = proc.child.kill().await;
  }
}
