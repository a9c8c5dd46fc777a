//! Realtime gateway: websocket sessions grouped by room.

pub mod hub;
pub mod protocol;
pub mod session;

pub use hub::WsRegistry;
pub use session::start_session;
