/* src/cli/core/src/dev/reload.rs */

// Live reload over Server-Sent Events. Browsers subscribe to RELOAD_PATH on
// the reload port; every `broadcast` tells them to reload.

use std::convert::Infallible;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::{Stream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

pub const RELOAD_PATH: &str = "/__rola/reload";
pub const RELOAD_EVENT: &str = "reload";

#[derive(Clone, Default)]
pub struct ReloadHub {
  clients: Arc<Mutex<Vec<mpsc::Sender<String>>>>,
}

impl ReloadHub {
  pub fn subscribe(&self) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    if let Ok(mut clients) = self.clients.lock() {
      clients.push(tx);
    }
    rx
  }

  #[cfg(test)]
  pub fn client_count(&self) -> usize {
    self.clients.lock().map(|c| c.len()).unwrap_or(0)
  }

  /// Send to every live subscriber; disconnected ones are dropped.
  /// Returns how many received the message.
  pub fn broadcast(&self, message: &str) -> usize {
    let Ok(mut clients) = self.clients.lock() else { return 0 };
    clients.retain(|tx| match tx.try_send(message.to_string()) {
      Ok(()) => true,
      // A slow client misses this reload but stays subscribed.
      Err(mpsc::error::TrySendError::Full(_)) => true,
      Err(mpsc::error::TrySendError::Closed(_)) => false,
    });
    clients.len()
  }

  pub fn router(&self) -> Router {
    Router::new()
      .route(RELOAD_PATH, get(handle_sse))
      // Pages are served from another port.
      .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
      .with_state(self.clone())
  }
}

async fn handle_sse(
  State(hub): State<ReloadHub>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
  tracing::debug!("reload client connected");
  let stream = ReceiverStream::new(hub.subscribe())
    .map(|data| Ok(Event::default().event(RELOAD_EVENT).data(data)));
  Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(15)))
}

/// Client banner for watch builds: reload the page on every event.
pub fn reloader_script(reload_port: u16) -> String {
  format!(
    "(function(){{if(typeof window==='undefined'||typeof EventSource==='undefined')return;\
     var s=new EventSource(location.protocol+'//'+location.hostname+':{reload_port}{RELOAD_PATH}');\
     s.addEventListener('{RELOAD_EVENT}',function(){{location.reload();}});}})();"
  )
}
