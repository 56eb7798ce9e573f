//! Transport independent message handling.
//!
//! Both the TCP and the WebSocket connection actors hand every decoded frame to
//! [`dispatch`] and call [`disconnect`] when they stop.

use log::{debug, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::game::{Color, Verdict};
use crate::models::{
    AppState, Attachment, ClientMessage, ConnectionId, GameId, GameSession, Role, ServerMessage,
};

/// Decodes one inbound frame and dispatches it. Frames that do not decode are
/// logged and otherwise ignored.
pub fn handle_text(state: &AppState, conn: ConnectionId, text: &str) {
    debug!("Received from {}: {}", conn, text);
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => dispatch(state, conn, message),
        Err(e) => warn!("Ignoring message from connection {}: {}", conn, e),
    }
}

/// Runs one client request. Domain errors go back to the requester only.
pub fn dispatch(state: &AppState, conn: ConnectionId, message: ClientMessage) {
    let kind = message.kind();
    let result = match message {
        ClientMessage::CreateGame { player_name } => handle_create(state, conn, &player_name),
        ClientMessage::JoinGame {
            game_id,
            player_name,
        } => handle_join(state, conn, game_id, &player_name),
        ClientMessage::SpectateGame {
            game_id,
            player_name,
        } => handle_spectate(state, conn, game_id, &player_name),
        ClientMessage::MakeMove {
            game_id,
            from_pos,
            to_pos,
        } => handle_move(state, conn, &game_id, from_pos, to_pos),
        ClientMessage::ChatMessage { game_id, text } => handle_chat(state, conn, &game_id, &text),
        ClientMessage::RequestState { game_id } => handle_request_state(state, conn, &game_id),
        ClientMessage::GetMoves { game_id, square } => {
            handle_get_moves(state, conn, &game_id, square)
        }
    };

    if let Err(e) = result {
        info!("Rejected {} from connection {}: {}", kind, conn, e);
        state.connections.send(conn, &ServerMessage::error(&e));
    }
}

/// Cleans up after a closed connection.
pub fn disconnect(state: &AppState, conn: ConnectionId) {
    if let Some(attachment) = state.connections.unregister(conn) {
        leave(state, conn, attachment);
    }
}

fn handle_create(state: &AppState, conn: ConnectionId, player_name: &str) -> SessionResult<()> {
    let previous = state.connections.attachment(conn);
    let (game_id, session) = state.registry.create_session(player_name, conn);
    if let Some(previous) = previous {
        leave(state, conn, previous);
    }
    state
        .connections
        .attach(conn, game_id.clone(), Role::White, player_name);

    let session = session.lock();
    state.connections.send(
        conn,
        &ServerMessage::GameCreated {
            game_id,
            player_color: Role::White,
            game_state: session.snapshot(),
        },
    );
    Ok(())
}

fn handle_join(
    state: &AppState,
    conn: ConnectionId,
    game_id: GameId,
    player_name: &str,
) -> SessionResult<()> {
    let previous = already_elsewhere(state, conn, &game_id)?;
    let session = state.registry.join_session(&game_id, player_name, conn)?;
    if let Some(previous) = previous {
        leave(state, conn, previous);
    }
    state
        .connections
        .attach(conn, game_id.clone(), Role::Black, player_name);

    let session = session.lock();
    let game_state = session.snapshot();
    state.connections.send(
        conn,
        &ServerMessage::GameJoined {
            game_id,
            player_color: Role::Black,
            game_state: game_state.clone(),
        },
    );
    if let Some(white) = session.player_connection(Color::White) {
        state.connections.send(
            white,
            &ServerMessage::OpponentJoined {
                opponent_name: player_name.to_string(),
                game_state: game_state.clone(),
            },
        );
    }
    let spectators: Vec<ConnectionId> = session.spectators().collect();
    state
        .connections
        .broadcast(&spectators, &ServerMessage::GameStateUpdate { game_state });
    Ok(())
}

fn handle_spectate(
    state: &AppState,
    conn: ConnectionId,
    game_id: GameId,
    player_name: &str,
) -> SessionResult<()> {
    let previous = already_elsewhere(state, conn, &game_id)?;
    let session = state.registry.spectate(&game_id, player_name, conn)?;
    if let Some(previous) = previous {
        leave(state, conn, previous);
    }
    state
        .connections
        .attach(conn, game_id.clone(), Role::Spectator, player_name);

    let session = session.lock();
    state.connections.send(
        conn,
        &ServerMessage::GameSpectating {
            game_id,
            player_color: Role::Spectator,
            game_state: session.snapshot(),
        },
    );
    broadcast_state(state, &session);
    Ok(())
}

fn handle_move(
    state: &AppState,
    conn: ConnectionId,
    game_id: &GameId,
    from_pos: [i32; 2],
    to_pos: [i32; 2],
) -> SessionResult<()> {
    let session = state.registry.lookup(game_id)?;
    let color = attachment_in(state, conn, game_id)
        .and_then(|attachment| attachment.role.color())
        .ok_or(SessionError::NotAPlayer)?;

    let mut session = session.lock();
    let record = session.apply_move(from_pos, to_pos, color)?;
    debug!(
        "Move {} -> {} by {} in game {}",
        record.mv.from, record.mv.to, color, game_id
    );
    if matches!(record.verdict, Verdict::Checkmate | Verdict::Stalemate) {
        info!("Game {} finished: {}", game_id, session.status());
    }
    broadcast_state(state, &session);
    Ok(())
}

fn handle_chat(
    state: &AppState,
    conn: ConnectionId,
    game_id: &GameId,
    text: &str,
) -> SessionResult<()> {
    let session = state.registry.lookup(game_id)?;
    let attachment = attachment_in(state, conn, game_id).ok_or(SessionError::NotInGame)?;

    let mut session = session.lock();
    session.add_player_chat(attachment.role, &attachment.name, text);
    debug!("Chat in game {} from {}: {}", game_id, attachment.name, text);
    broadcast_state(state, &session);
    Ok(())
}

fn handle_request_state(
    state: &AppState,
    conn: ConnectionId,
    game_id: &GameId,
) -> SessionResult<()> {
    let session = state.registry.lookup(game_id)?;
    let game_state = session.lock().snapshot();
    state
        .connections
        .send(conn, &ServerMessage::GameStateUpdate { game_state });
    Ok(())
}

fn handle_get_moves(
    state: &AppState,
    conn: ConnectionId,
    game_id: &GameId,
    square: [i32; 2],
) -> SessionResult<()> {
    let session = state.registry.lookup(game_id)?;
    let moves = session.lock().legal_moves_from(square)?;
    state.connections.send(
        conn,
        &ServerMessage::AvailableMoves {
            game_id: game_id.clone(),
            square,
            moves,
        },
    );
    Ok(())
}

/// Pushes a fresh snapshot to everything attached to `session`. Called with the
/// session lock held so snapshots reach every socket in mutation order.
fn broadcast_state(state: &AppState, session: &GameSession) {
    let message = ServerMessage::GameStateUpdate {
        game_state: session.snapshot(),
    };
    state.connections.broadcast(&session.attached(), &message);
}

/// Detaches `conn` from the game it was attached to and tells whoever is left.
fn leave(state: &AppState, conn: ConnectionId, attachment: Attachment) {
    state.connections.detach(conn);
    let Some(departure) =
        state
            .registry
            .remove_connection(&attachment.game_id, conn, &attachment.name)
    else {
        return;
    };
    info!(
        "Connection {} ({}) left game {} as {:?}",
        conn, attachment.name, attachment.game_id, departure.role
    );
    let Some(session) = departure.session else {
        return;
    };

    let session = session.lock();
    let game_state = session.snapshot();
    let message = match departure.role.color() {
        Some(opponent_color) => ServerMessage::OpponentLeft {
            opponent_color,
            game_state,
        },
        None => ServerMessage::GameStateUpdate { game_state },
    };
    state.connections.broadcast(&session.attached(), &message);
}

/// The connection's attachment if it is attached to `game_id`.
fn attachment_in(state: &AppState, conn: ConnectionId, game_id: &GameId) -> Option<Attachment> {
    state
        .connections
        .attachment(conn)
        .filter(|attachment| &attachment.game_id == game_id)
}

/// Current attachment, refusing a second seat in the same game.
fn already_elsewhere(
    state: &AppState,
    conn: ConnectionId,
    game_id: &GameId,
) -> SessionResult<Option<Attachment>> {
    match state.connections.attachment(conn) {
        Some(attachment) if &attachment.game_id == game_id => Err(SessionError::AlreadyJoined),
        other => Ok(other),
    }
}
