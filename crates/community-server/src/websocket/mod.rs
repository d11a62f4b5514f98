//! Real-time event feed over WebSocket

pub mod events;
pub mod handler;

pub use events::EventBroadcaster;
pub use handler::ws_handler;
