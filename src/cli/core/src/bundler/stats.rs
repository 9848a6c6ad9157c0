/* src/cli/core/src/bundler/stats.rs */

// Stats for one compiled target: read from the file a bundler command may
// leave in the output directory, or derived by scanning what it emitted.

use std::path::Path;

use rola_engine::{Asset, BuildConfig, BuildStats, CompileError, CompileWarning};
use serde::Deserialize;

/// Optional stats report written by `bundler_command` into `$ROLA_OUT_DIR`.
pub const STATS_FILE: &str = "rola-stats.json";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Diagnostic {
  Plain(String),
  Located { message: String, file: Option<String> },
}

impl Diagnostic {
  fn into_parts(self) -> (String, Option<String>) {
    match self {
      Self::Plain(message) => (message, None),
      Self::Located { message, file } => (message, file),
    }
  }
}

#[derive(Debug, Deserialize)]
struct StatsReport {
  #[serde(default)]
  assets: Vec<Asset>,
  #[serde(default)]
  errors: Vec<Diagnostic>,
  #[serde(default)]
  warnings: Vec<Diagnostic>,
}

impl From<StatsReport> for BuildStats {
  fn from(report: StatsReport) -> Self {
    let errors = report
      .errors
      .into_iter()
      .map(|d| match d.into_parts() {
        (msg, Some(file)) => CompileError::new(msg).in_file(file),
        (msg, None) => CompileError::new(msg),
      })
      .collect();
    let warnings = report
      .warnings
      .into_iter()
      .map(|d| match d.into_parts() {
        (msg, Some(file)) => CompileWarning::new(msg).in_file(file),
        (msg, None) => CompileWarning::new(msg),
      })
      .collect();
    Self { assets: report.assets, errors, warnings }
  }
}

/// Consume the report file if present. It is removed so it never ships.
pub(super) async fn read_report(out_dir: &Path) -> Result<Option<BuildStats>, String> {
  let path = out_dir.join(STATS_FILE);
  let content = match tokio::fs::read_to_string(&path).await {
    Ok(c) => c,
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
    Err(e) => return Err(format!("failed to read {}: {e}", path.display())),
  };
  let _ = tokio::fs::remove_file(&path).await;
  let report: StatsReport = serde_json::from_str(&content)
    .map_err(|e| format!("invalid {}: {e}", path.display()))?;
  Ok(Some(report.into()))
}

/// The bundle and files sharing its stem (`client.js`, `client.js.map`, `client.css`).
/// Rendered pages in the same directory are not assets of the compile.
pub(super) async fn scan_outputs(out_dir: &Path, config: &BuildConfig) -> BuildStats {
  let bundle = config.bundle_name();
  let stem = bundle.split('.').next().unwrap_or(&bundle).to_string();
  let mut assets = Vec::new();
  let Ok(mut entries) = tokio::fs::read_dir(out_dir).await else {
    return BuildStats::default();
  };
  while let Ok(Some(entry)) = entries.next_entry().await {
    let name = entry.file_name().to_string_lossy().into_owned();
    let related = name == bundle || name.split('.').next() == Some(stem.as_str());
    if !related || name.ends_with(".html") {
      continue;
    }
    if let Ok(meta) = entry.metadata().await
      && meta.is_file()
    {
      assets.push(Asset { name, size: meta.len() });
    }
  }
  assets.sort_by(|a, b| a.name.cmp(&b.name));
  BuildStats { assets, ..BuildStats::default() }
}

#[cfg(test)]
mod tests {
  use rola_engine::{ConfigInput, Context, assemble};

  use super::*;

  fn client_config() -> BuildConfig {
    let input =
      ConfigInput { entry_path: "client.js".into(), out_dir: "build".into(), ..Default::default() };
    assemble(input, &Context::project("app", "1.0.0")).unwrap()
  }

  #[tokio::test]
  async fn report_parses_mixed_diagnostics() {
    let tmp = tempfile::tempdir().unwrap();
    let json = r#"{
      "assets": [{"name": "client.js", "size": 42}],
      "errors": ["plain", {"message": "located", "file": "a.js"}],
      "warnings": [{"message": "w"}]
    }"#;
    std::fs::write(tmp.path().join(STATS_FILE), json).unwrap();

    let stats = read_report(tmp.path()).await.unwrap().unwrap();
    assert_eq!(stats.assets, vec![Asset { name: "client.js".into(), size: 42 }]);
    assert_eq!(stats.errors[0], CompileError::new("plain"));
    assert_eq!(stats.errors[1], CompileError::new("located").in_file("a.js"));
    assert_eq!(stats.warnings[0], CompileWarning::new("w"));
    assert!(!tmp.path().join(STATS_FILE).exists());
  }

  #[tokio::test]
  async fn missing_report_is_none() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(read_report(tmp.path()).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn scan_skips_pages_and_unrelated_files() {
    let tmp = tempfile::tempdir().unwrap();
    for (name, body) in
      [("client.js", "abc"), ("client.js.map", "{}"), ("index.html", "<p>"), ("logo.svg", "x")]
    {
      std::fs::write(tmp.path().join(name), body).unwrap();
    }
    let stats = scan_outputs(tmp.path(), &client_config()).await;
    let names: Vec<_> = stats.assets.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["client.js", "client.js.map"]);
    assert_eq!(stats.total_size(), 5);
  }
}
