//! Multi-session two-player chess server.
//!
//! Clients reach the same session registry over raw TCP (newline delimited
//! JSON) or a WebSocket at `/ws`.

pub mod config;
pub mod error;
pub mod game;
pub mod models;
pub mod protocol;
pub mod routes;
pub mod tcp;
pub mod websocket;
