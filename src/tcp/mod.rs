//! Raw TCP transport: newline delimited JSON, one actor per connection.

pub mod codec;
pub mod session;

use log::{info, warn};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::models::AppState;
pub use codec::{Frame, FrameCodec};
pub use session::TcpSession;

/// Accepts connections until the process exits. Accept errors are logged and
/// retried after a short pause.
pub async fn serve(
    listener: TcpListener,
    app_state: Arc<AppState>,
    max_frame_len: usize,
) -> io::Result<()> {
    info!("TCP listener on {}", listener.local_addr()?);
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nodelay(true) {
                    warn!("Could not set TCP_NODELAY for {}: {}", peer, e);
                }
                TcpSession::start(stream, peer, Arc::clone(&app_state), max_frame_len);
            }
            Err(e) => {
                warn!("Accept failed: {}", e);
                actix_rt::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
