/* src/cli/core/src/shutdown.rs */

use std::future::pending;

use tokio::signal::unix::{Signal, SignalKind, signal};

/// Listens for the signals that end a build or watch session: ctrl-c,
/// SIGTERM and SIGHUP.
pub struct ShutdownSignal {
  terminate: Option<Signal>,
  hangup: Option<Signal>,
}

fn install(kind: SignalKind, name: &str) -> Option<Signal> {
  match signal(kind) {
    Ok(s) => Some(s),
    Err(e) => {
      tracing::warn!("failed to listen for {name}: {e}");
      None
    }
  }
}

async fn next(sig: &mut Option<Signal>) {
  match sig {
    Some(s) => {
      s.recv().await;
    }
    None => pending::<()>().await,
  }
}

async fn interrupt() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::warn!("failed to listen for ctrl-c: {e}");
    pending::<()>().await;
  }
}

impl ShutdownSignal {
  /// Must be called inside the runtime. Handlers stay installed from here on.
  pub fn listen() -> Self {
    Self {
      terminate: install(SignalKind::terminate(), "SIGTERM"),
      hangup: install(SignalKind::hangup(), "SIGHUP"),
    }
  }

  /// Resolves with the name of the first signal received.
  pub async fn recv(&mut self) -> &'static str {
    tokio::select! {
      () = interrupt() => "SIGINT",
      () = next(&mut self.terminate) => "SIGTERM",
      () = next(&mut self.hangup) => "SIGHUP",
    }
  }
}
