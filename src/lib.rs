//! Local-network webcam relay
//!
//! Browsers push JPEG frames over a WebSocket and the relay fans every frame
//! out to all other connected clients, unbuffered and unacknowledged.

pub mod config;
pub mod error;
pub mod model;
pub mod registry;
pub mod relay;
pub mod server;
pub mod util;
