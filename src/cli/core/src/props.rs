/* src/cli/core/src/props.rs */

// Properties file handed to plugins and the server bundle: project context
// plus the head/body tags the presets contribute to every document.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use rola_engine::{Context, PresetRegistry};
use serde::Serialize;

pub const PROPS_FILE: &str = "props.json";

#[derive(Debug, Serialize)]
struct Props<'a> {
  context: PropsContext<'a>,
  tags: Tags,
}

#[derive(Debug, Serialize)]
struct PropsContext<'a> {
  name: &'a str,
  version: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct Tags {
  head: String,
  body: String,
}

pub fn client_script_tag(version: &str) -> String {
  format!("<script src='/client.js?v{version}'></script>")
}

/// Write `<temp_dir>/props.json`. Failure here is fatal for the pass.
pub fn write_props(
  temp_dir: &Path,
  ctx: &Context,
  presets: &PresetRegistry,
  has_client: bool,
) -> Result<PathBuf> {
  let fragments =
    presets.run_create_document(ctx, None).context("createDocument failed for properties file")?;
  let mut tags = Tags { head: fragments.head, body: fragments.body };
  if has_client {
    tags.body.push_str(&client_script_tag(&ctx.version));
  }
  let props = Props { context: PropsContext { name: &ctx.name, version: &ctx.version }, tags };

  std::fs::create_dir_all(temp_dir)
    .with_context(|| format!("failed to create {}", temp_dir.display()))?;
  let path = temp_dir.join(PROPS_FILE);
  let json = serde_json::to_string_pretty(&props)?;
  std::fs::write(&path, json).with_context(|| format!("failed to write {}", path.display()))?;
  Ok(path)
}
