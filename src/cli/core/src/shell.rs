/* src/cli/core/src/shell.rs */

// Shell and child-process helpers shared by the bundler, route protocol and dev server.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tokio::io::AsyncWriteExt;

/// Environment variable carrying the CLI version to every spawned collaborator.
pub const VERSION_ENV: &str = "ROLA_VERSION";

pub type EnvVars = Vec<(String, String)>;

/// Check if a command exists on PATH.
pub(crate) fn which_exists(cmd: &str) -> bool {
  Command::new("which")
    .arg(cmd)
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .status()
    .map(|s| s.success())
    .unwrap_or(false)
}

/// JavaScript runtime used to execute the server bundle: explicit, else bun, else node.
pub(crate) fn pick_runtime(explicit: Option<&str>) -> String {
  match explicit {
    Some(rt) if !rt.trim().is_empty() => rt.trim().to_string(),
    _ if which_exists("bun") => "bun".to_string(),
    _ => "node".to_string(),
  }
}

/// Output of a finished collaborator process.
#[derive(Debug)]
pub(crate) struct Captured {
  pub success: bool,
  pub status: String,
  pub stdout: String,
  pub stderr: String,
}

impl Captured {
  /// stderr then stdout, trimmed; used as the error message of a failed run.
  pub fn diagnostics(&self) -> String {
    let mut msg = String::new();
    for part in [self.stderr.trim(), self.stdout.trim()] {
      if !part.is_empty() {
        if !msg.is_empty() {
          msg.push('\n');
        }
        msg.push_str(part);
      }
    }
    msg
  }
}

/// Run a program asynchronously, optionally feeding `stdin`, capturing both streams.
pub(crate) async fn capture(
  program: &str,
  args: &[&str],
  base_dir: &Path,
  env: &[(String, String)],
  stdin: Option<&str>,
) -> Result<Captured> {
  let mut cmd = tokio::process::Command::new(program);
  cmd.args(args);
  cmd.current_dir(base_dir);
  cmd.stdin(if stdin.is_some() { Stdio::piped() } else { Stdio::null() });
  cmd.stdout(Stdio::piped());
  cmd.stderr(Stdio::piped());
  cmd.kill_on_drop(true);
  for (k, v) in env {
    cmd.env(k, v);
  }
  let mut child = cmd.spawn().with_context(|| format!("failed to run {program}"))?;
  if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
    pipe.write_all(input.as_bytes()).await.context("failed to write to child stdin")?;
  }
  let output = child.wait_with_output().await.with_context(|| format!("{program} did not finish"))?;
  Ok(Captured {
    success: output.status.success(),
    status: output.status.to_string(),
    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn explicit_runtime_wins() {
    assert_eq!(pick_runtime(Some(" deno ")), "deno");
    assert!(["bun", "node"].contains(&pick_runtime(None).as_str()));
  }

  #[tokio::test]
  async fn capture_feeds_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let out = capture("sh", &["-c", "cat"], dir.path(), &[], Some("hello")).await.unwrap();
    assert!(out.success);
    assert_eq!(out.stdout, "hello");
  }
}
