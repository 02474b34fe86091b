//! Broadcast relay
//!
//! A single task owns the [`Registry`] and handles every [`RelayEvent`] to
//! completion before looking at the next one. Registration, removal and
//! fan-out therefore never interleave, and frames from one sender reach
//! each peer in the order they were sent.

use bytes::Bytes;
use tokio::sync::{
    mpsc::{self, error::SendError},
    watch,
};
use tracing::{debug, info, trace};

use crate::model::{
    client::{Client, ClientId, Delivery},
    event::RelayEvent,
};
use crate::registry::Registry;

pub struct Relay {
    registry: Registry,
    connections: watch::Sender<usize>,
}

/// Cheap, cloneable handle used by connection tasks to reach the relay loop.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    events: mpsc::UnboundedSender<RelayEvent>,
    connections: watch::Receiver<usize>,
}

impl RelayHandle {
    pub fn send(&self, event: RelayEvent) -> Result<(), SendError<RelayEvent>> {
        self.events.send(event)
    }

    /// Number of registered connections, updated after every change.
    pub fn connections(&self) -> watch::Receiver<usize> {
        self.connections.clone()
    }
}

impl Relay {
    pub fn new() -> (Relay, watch::Receiver<usize>) {
        let (connections, rx) = watch::channel(0);
        let relay = Relay {
            registry: Registry::new(),
            connections,
        };
        (relay, rx)
    }

    /// Start the relay loop on the current runtime.
    ///
    /// The loop stops once every [`RelayHandle`] has been dropped.
    pub fn spawn() -> (RelayHandle, tokio::task::JoinHandle<()>) {
        let (relay, connections) = Relay::new();
        let (events, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(relay.run(rx));
        (RelayHandle { events, connections }, task)
    }

    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<RelayEvent>) {
        while let Some(event) = rx.recv().await {
            self.handle(event);
        }
        debug!("Relay loop stopped");
    }

    /// Apply one event. Returns how many peers a frame was handed to.
    pub fn handle(&mut self, event: RelayEvent) -> usize {
        trace!(client_id = %event.client_id(), "Relay event");

        match event {
            RelayEvent::Connected(client) => {
                let id = client.id;
                self.registry.register(client);
                self.publish();
                info!(client_id = %id, connections = self.registry.len(), "Client registered");
                0
            }
            RelayEvent::Frame(origin, frame) => propagate(origin, &frame, self.registry.all()),
            RelayEvent::Closed(id) => {
                if let Some(client) = self.registry.unregister(id) {
                    self.publish();
                    let session = chrono::Utc::now() - client.connected_at;
                    info!(
                        client_id = %id,
                        connections = self.registry.len(),
                        session_secs = session.num_seconds(),
                        "Client unregistered"
                    );
                }
                0
            }
        }
    }

    fn publish(&self) {
        self.connections.send_replace(self.registry.len());
    }
}

/// Hand one frame to every writable client except the one it came from.
///
/// Each delivery is independent: a full or closed peer is skipped and the
/// remaining peers are still served.
fn propagate(origin: ClientId, frame: &Bytes, clients: &[Client]) -> usize {
    let mut delivered = 0;

    for client in clients {
        if client.id == origin {
            // Do not propagate to originating client.
            continue;
        }

        if !client.is_writable() {
            debug!(client_id = %client.id, "Peer not writable, dropping frame");
            continue;
        }

        match client.deliver(frame) {
            Delivery::Sent => delivered += 1,
            Delivery::Skipped => {
                debug!(client_id = %client.id, "Peer busy, dropping frame");
            }
            Delivery::Closed => {
                debug!(client_id = %client.id, "Peer closing, dropping frame");
            }
        }
    }

    trace!(client_id = %origin, bytes = frame.len(), peers = delivered, "Frame relayed");
    delivered
}
