use crate::models::connections::ConnectionTable;
use crate::models::registry::SessionRegistry;

/// Application state shared between connections
#[derive(Default)]
pub struct AppState {
    pub registry: SessionRegistry,
    pub connections: ConnectionTable,
}

impl AppState {
    pub fn new() -> Self {
        AppState::default()
    }
}
