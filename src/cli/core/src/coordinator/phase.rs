/* src/cli/core/src/coordinator/phase.rs */

/// Build Coordinator lifecycle.
///
/// `Idle -> Configuring -> Compiling -> {Succeeded, Failed}`, then back to
/// `Idle` (one-shot) or `Compiling` (next watch cycle). An empty config list
/// goes straight from `Configuring` to `Succeeded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Idle,
  Configuring,
  Compiling,
  Succeeded,
  Failed,
}

impl Phase {
  pub fn can_transition_to(self, next: Phase) -> bool {
    use Phase::*;
    matches!(
      (self, next),
      (Idle, Configuring)
        | (Configuring, Compiling | Succeeded | Failed)
        | (Compiling, Succeeded | Failed)
        | (Succeeded | Failed, Idle | Compiling)
    )
  }

  pub fn is_done(self) -> bool {
    matches!(self, Phase::Succeeded | Phase::Failed)
  }
}
