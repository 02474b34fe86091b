use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};

/// How many frames may wait for a slow socket before new ones are dropped.
pub const OUTBOUND_QUEUE_DEPTH: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    fn next() -> ClientId {
        static ID_COUNTER: AtomicU64 = AtomicU64::new(0);
        ClientId(ID_COUNTER.fetch_add(1, Ordering::SeqCst))
    }
}

impl Deref for ClientId {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of handing one frame to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The outbound queue was full; the frame was dropped for this peer.
    Skipped,
    /// The socket writer is gone. The connection's own close path will
    /// unregister it.
    Closed,
}

/// One live relay connection, as seen by the relay loop.
///
/// The relay never touches the socket. It only pushes frames into the
/// bounded queue that the connection's writer task drains.
#[derive(Debug)]
pub struct Client {
    pub id: ClientId,
    pub connected_at: DateTime<Utc>,
    outbound: mpsc::Sender<Bytes>,
}

impl Client {
    /// Create a client along with the receiving end of its outbound queue.
    pub fn new() -> (Client, mpsc::Receiver<Bytes>) {
        Self::with_queue_depth(OUTBOUND_QUEUE_DEPTH)
    }

    /// Like [`Client::new`] with a custom queue depth. A depth of zero is
    /// raised to one.
    pub fn with_queue_depth(depth: usize) -> (Client, mpsc::Receiver<Bytes>) {
        let (outbound, rx) = mpsc::channel(depth.max(1));
        let client = Client {
            id: ClientId::next(),
            connected_at: Utc::now(),
            outbound,
        };
        (client, rx)
    }

    pub fn is_writable(&self) -> bool {
        !self.outbound.is_closed() && self.outbound.capacity() > 0
    }

    /// Enqueue a frame without waiting. Never blocks the caller.
    pub fn deliver(&self, frame: &Bytes) -> Delivery {
        match self.outbound.try_send(frame.clone()) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => Delivery::Skipped,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }
}
