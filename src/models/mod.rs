pub mod app_state;
pub mod bounded_log;
pub mod connections;
pub mod game_state;
pub mod messages;
pub mod registry;

// Re-export important types
pub use app_state::*;
pub use bounded_log::BoundedLog;
pub use connections::{Attachment, ConnectionId, ConnectionTable, DeliveryError, Outbox, Role};
pub use game_state::*;
pub use messages::*;
pub use registry::{Departure, SessionRegistry, SharedSession};
