/* src/cli/core/src/main.rs */

mod bundler;
mod cleanup;
mod config;
mod coordinator;
mod dev;
mod generator;
mod log;
mod logger;
mod project;
mod props;
mod routes;
mod run;
mod shell;
mod shutdown;
mod ui;
mod watch;

#[cfg(test)]
mod testing;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use bundler::CommandBundler;
use cleanup::Cleanup;
use log::{LogStore, TerminalSink};
use project::Project;
use run::Pipeline;
use shutdown::ShutdownSignal;

#[derive(Parser)]
#[command(name = "rola", version, about = "Compile, render and serve a rola project")]
struct Cli {
  /// Print orchestration diagnostics
  #[arg(short, long, global = true)]
  verbose: bool,
  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Args)]
struct Common {
  /// Path to rola.toml (auto-detected if omitted)
  #[arg(short, long)]
  config: Option<PathBuf>,
  /// Dev server port
  #[arg(short, long, env = "PORT")]
  port: Option<u16>,
}

#[derive(Subcommand)]
enum Command {
  /// Compile once, render every page, then exit
  Build {
    #[command(flatten)]
    common: Common,
    /// Run the server bundle while pages render
    #[arg(long)]
    serve: bool,
  },
  /// Compile, render and serve continuously
  Watch {
    #[command(flatten)]
    common: Common,
  },
}

/// Warn if the temp dir is not covered by any gitignore rule
fn warn_temp_not_gitignored(base_dir: &Path, temp_dir: &str) {
  let output = std::process::Command::new("git")
    .args(["check-ignore", "-q", temp_dir])
    .current_dir(base_dir)
    .output();
  // exit 1 = not ignored; 0 = ignored; other = not a git repo or git missing
  if let Ok(o) = output
    && o.status.code() == Some(1)
  {
    ui::warn(&format!("{temp_dir}/ is not in .gitignore -- consider adding it"));
  }
}

fn reset_out_dir(dir: &Path) -> Result<()> {
  match std::fs::remove_dir_all(dir) {
    Ok(()) => Ok(()),
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
    Err(e) => Err(e).with_context(|| format!("failed to clear {}", dir.display())),
  }
}

fn pipeline(project: Project, cleanup: &Cleanup) -> Result<Pipeline<CommandBundler>> {
  reset_out_dir(&project.out_dir())?;
  cleanup.remove_dir(project.temp_dir());
  let bundler = CommandBundler::new(
    project.base_dir.clone(),
    project.config.build.bundler_command.clone(),
    project.child_env(),
  )
  .watching(project.watch_dirs(), project.watch_ignore());
  let log = LogStore::new(TerminalSink);
  Ok(Pipeline::new(project, Arc::new(bundler), log, cleanup.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  logger::init_logger(cli.verbose);

  let Some(command) = cli.command else {
    Cli::command().print_help()?;
    return Ok(());
  };

  let cleanup = Cleanup::new();
  // Runs the registered tasks however `main` returns.
  let _guard = cleanup.guard();
  cleanup.run_on_panic();
  let mut signals = ShutdownSignal::listen();

  match command {
    Command::Build { common, serve } => {
      ui::banner("build");
      let project = Project::discover(common.config, common.port)?;
      warn_temp_not_gitignored(&project.base_dir, &project.config.build.temp_dir);
      let pipeline = pipeline(project, &cleanup)?;
      let summary = tokio::select! {
        summary = pipeline.run_build(serve) => summary?,
        name = signals.recv() => anyhow::bail!("interrupted by {name}"),
      };
      ui::blank();
      let status = format!(
        "{} config(s), {} page(s) rendered, {} failed",
        summary.configs,
        summary.report.rendered.len(),
        summary.report.failed.len()
      );
      if summary.outcome.failed || !summary.report.failed.is_empty() {
        ui::warn(&status);
      } else {
        ui::ok(&status);
      }
    }
    Command::Watch { common } => {
      ui::banner("watch");
      let project = Project::discover(common.config, common.port)?;
      warn_temp_not_gitignored(&project.base_dir, &project.config.build.temp_dir);
      let shutdown = async move {
        let name = signals.recv().await;
        tracing::debug!("received {name}, shutting down");
      };
      pipeline(project, &cleanup)?.run_watch(shutdown).await?;
      ui::blank();
      ui::arrow("stopped");
    }
  }

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_shape_is_valid() {
    Cli::command().debug_assert();
  }

  #[test]
  fn port_flag_parses() {
    let cli = Cli::try_parse_from(["rola", "build", "--port", "4100", "--serve"]).unwrap();
    let Some(Command::Build { common, serve }) = cli.command else { panic!("expected build") };
    assert_eq!(common.port, Some(4100));
    assert!(serve);
  }

  #[test]
  fn no_subcommand_is_allowed() {
    assert!(Cli::try_parse_from(["rola"]).unwrap().command.is_none());
  }

  #[test]
  fn reset_out_dir_tolerates_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("build");
    reset_out_dir(&out).unwrap();
    std::fs::create_dir_all(out.join("assets")).unwrap();
    reset_out_dir(&out).unwrap();
    assert!(!out.exists());
  }
}
