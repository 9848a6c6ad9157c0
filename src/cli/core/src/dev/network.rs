/* src/cli/core/src/dev/network.rs */

use std::time::{Duration, Instant};

use rola_engine::ServerProcessError;

pub(super) fn is_port_free(port: u16) -> bool {
  std::net::TcpListener::bind(("0.0.0.0", port)).is_ok()
}

/// Poll a TCP port until it accepts connections, or fail after timeout.
/// Tries both IPv6 (::1) and IPv4 (127.0.0.1); runtimes differ in what they bind.
pub(super) async fn wait_for_port(port: u16, timeout: Duration) -> Result<(), ServerProcessError> {
  let deadline = Instant::now() + timeout;
  loop {
    if tokio::net::TcpStream::connect(("::1", port)).await.is_ok()
      || tokio::net::TcpStream::connect(("127.0.0.1", port)).await.is_ok()
    {
      return Ok(());
    }
    if Instant::now() >= deadline {
      return Err(ServerProcessError::PortTimeout { port, secs: timeout.as_secs() });
    }
    tokio::time::sleep(Duration::from_millis(100)).await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn sees_a_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    assert!(!is_port_free(port));
    wait_for_port(port, Duration::from_secs(1)).await.unwrap();
  }

  #[tokio::test]
  async fn times_out_on_a_closed_port() {
    let port = {
      let l = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
      l.local_addr().unwrap().port()
    };
    let err = wait_for_port(port, Duration::from_millis(200)).await.unwrap_err();
    assert!(matches!(err, ServerProcessError::PortTimeout { .. }));
  }
}
