pub mod game_handlers;

pub use game_handlers::{disconnect, dispatch, handle_text};
