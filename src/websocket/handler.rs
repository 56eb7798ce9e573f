use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use std::sync::Arc;

use crate::models::{AppState, ConnectionId, Deliver};
use crate::protocol;

/// WebSocket transport for one client
pub struct ChessWebSocket {
    pub id: ConnectionId,
    pub app_state: web::Data<AppState>,
}

impl ChessWebSocket {
    pub fn new(app_state: web::Data<AppState>) -> Self {
        ChessWebSocket {
            id: ConnectionId::new(),
            app_state,
        }
    }
}

impl Actor for ChessWebSocket {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let recipient = ctx.address().recipient::<Deliver>();
        self.app_state
            .connections
            .register(self.id, Arc::new(recipient));
        info!(
            "WebSocket connection started: {} ({} live)",
            self.id,
            self.app_state.connections.len()
        );
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        protocol::disconnect(&self.app_state, self.id);
        info!(
            "WebSocket connection closed: {} ({} live)",
            self.id,
            self.app_state.connections.len()
        );
        Running::Stop
    }
}

impl Handler<Deliver> for ChessWebSocket {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(&*msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ChessWebSocket {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Text(text)) => {
                protocol::handle_text(&self.app_state, self.id, &text);
            }
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported ({})", self.id);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection {} closed: {:?}", self.id, reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let ws = ChessWebSocket::new(app_state);
    info!("New WebSocket connection request: {}", ws.id);
    ws::start(ws, &req, stream)
}
