use actix::io::{FramedWrite, WriteHandler};
use actix::prelude::*;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodecError};

use super::codec::{Frame, FrameCodec};
use crate::models::{AppState, ConnectionId, Deliver};
use crate::protocol;

/// TCP transport for one client
pub struct TcpSession {
    id: ConnectionId,
    peer: SocketAddr,
    app_state: Arc<AppState>,
    framed: FramedWrite<Arc<str>, OwnedWriteHalf, FrameCodec>,
}

impl TcpSession {
    /// Spawns the actor owning `stream`.
    pub fn start(
        stream: TcpStream,
        peer: SocketAddr,
        app_state: Arc<AppState>,
        max_frame_len: usize,
    ) -> Addr<TcpSession> {
        TcpSession::create(move |ctx| {
            let (read_half, write_half) = stream.into_split();
            TcpSession::add_stream(
                FramedRead::new(read_half, FrameCodec::new(max_frame_len)),
                ctx,
            );
            TcpSession {
                id: ConnectionId::new(),
                peer,
                app_state,
                framed: FramedWrite::new(write_half, FrameCodec::new(max_frame_len), ctx),
            }
        })
    }
}

impl Actor for TcpSession {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient::<Deliver>();
        self.app_state
            .connections
            .register(self.id, Arc::new(recipient));
        info!(
            "TCP connection started: {} from {} ({} live)",
            self.id,
            self.peer,
            self.app_state.connections.len()
        );
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        protocol::disconnect(&self.app_state, self.id);
        info!(
            "TCP connection closed: {} from {} ({} live)",
            self.id,
            self.peer,
            self.app_state.connections.len()
        );
        Running::Stop
    }
}

impl Handler<Deliver> for TcpSession {
    type Result = ();

    fn handle(&mut self, msg: Deliver, _: &mut Self::Context) {
        self.framed.write(msg.0);
    }
}

impl WriteHandler<LinesCodecError> for TcpSession {
    fn error(&mut self, err: LinesCodecError, _: &mut Self::Context) -> Running {
        warn!("Write to {} failed: {}", self.id, err);
        Running::Stop
    }
}

impl StreamHandler<Result<Frame, LinesCodecError>> for TcpSession {
    fn handle(&mut self, msg: Result<Frame, LinesCodecError>, ctx: &mut Self::Context) {
        match msg {
            Ok(Frame::Line(line)) => {
                let line = line.trim();
                if !line.is_empty() {
                    protocol::handle_text(&self.app_state, self.id, line);
                }
            }
            Ok(Frame::Oversized) => {
                warn!("Dropped oversized frame from {}", self.id);
            }
            Ok(Frame::Malformed) => {
                warn!("Dropped non UTF-8 frame from {}", self.id);
            }
            Err(e) => {
                warn!("Read from {} failed: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}
