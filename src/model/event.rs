//! Events delivered to the relay loop
//!
//! Every connection task reports what happens on its socket through these
//! events. The relay loop consumes them one at a time, in arrival order.

use bytes::Bytes;

use crate::model::client::{Client, ClientId};

#[derive(Debug)]
pub enum RelayEvent {
    /// The WebSocket handshake completed and the client is ready for frames.
    Connected(Client),

    /// A message arrived from a client and should be fanned out to its peers.
    Frame(ClientId, Bytes),

    /// The client closed or its transport failed.
    Closed(ClientId),
}

impl RelayEvent {
    /// The client the event originates from.
    pub fn client_id(&self) -> ClientId {
        match self {
            RelayEvent::Connected(client) => client.id,
            RelayEvent::Frame(id, _) | RelayEvent::Closed(id) => *id,
        }
    }
}
