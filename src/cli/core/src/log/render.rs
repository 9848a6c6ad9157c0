/* src/cli/core/src/log/render.rs */

use rola_engine::stats::{CLIENT_SLOT, SERVER_SLOT};
use rola_engine::{BuildStats, StatsSlots};

use super::{LogSink, LogState};
use crate::ui::{self, BOLD, DIM, RESET};

/// Prints what changed between two states.
#[derive(Default)]
pub struct TerminalSink;

fn added<'a>(prev: &[String], next: &'a [String]) -> &'a [String] {
  // A shorter list means a reset; everything in `next` is new.
  if next.len() >= prev.len() && next.starts_with(prev) { &next[prev.len()..] } else { next }
}

fn print_stats(slots: &StatsSlots) {
  for (slot, label) in [(CLIENT_SLOT, "client"), (SERVER_SLOT, "server")] {
    let Some(stats) = &slots[slot] else { continue };
    ui::ok(&format!(
      "{label} {DIM}({}, {} assets){RESET}",
      ui::format_size(stats.total_size()),
      stats.assets.len()
    ));
    print_assets(stats);
  }
}

fn print_assets(stats: &BuildStats) {
  for asset in &stats.assets {
    ui::detail(&format!("{DIM}{:<32}{RESET} {}", asset.name, ui::format_size(asset.size)));
  }
}

impl LogSink for TerminalSink {
  fn render(&mut self, prev: &LogState, next: &LogState) {
    for action in added(&prev.actions, &next.actions) {
      println!("  {BOLD}{action}{RESET}");
    }
    if next.stats != prev.stats {
      print_stats(&next.stats);
    }
    for msg in added(&prev.error, &next.error) {
      ui::fail(msg);
    }
    for msg in added(&prev.warn, &next.warn) {
      ui::warn(msg);
    }
    for addr in added(&prev.server, &next.server) {
      ui::arrow(&format!("listening on {addr}"));
    }
    if next.pages != prev.pages && !next.pages.is_empty() {
      ui::ok(&format!("rendered {} page(s)", next.pages.len()));
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
  }

  #[test]
  fn added_is_the_suffix() {
    let prev = list(&["a"]);
    let next = list(&["a", "b"]);
    assert_eq!(added(&prev, &next), &list(&["b"])[..]);
  }

  #[test]
  fn reset_counts_as_all_new() {
    let prev = list(&["a", "b"]);
    let next = list(&["c"]);
    assert_eq!(added(&prev, &next), &next[..]);
    assert!(added(&prev, &[]).is_empty());
  }

  #[test]
  fn render_does_not_panic() {
    let mut sink = TerminalSink;
    let next = LogState {
      actions: list(&["build"]),
      stats: [Some(BuildStats::with_assets([("client.js", 10)])), None],
      pages: list(&["/"]),
      ..LogState::default()
    };
    sink.render(&LogState::default(), &next);
  }
}
