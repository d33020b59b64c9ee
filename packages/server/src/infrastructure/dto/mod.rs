//! Data transfer objects for the WebSocket protocol, the HTTP API and the
//! users file.

pub mod directory;
pub mod http;
pub mod websocket;
