use std::io;
use std::net::SocketAddr;

/// Errors that can stop the relay server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listen socket could not be opened.
    #[error("failed to bind {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    /// The bound listener has no local address.
    #[error("failed to read listener address")]
    LocalAddr(#[source] io::Error),

    /// The HTTP server loop failed.
    #[error("server stopped unexpectedly")]
    Serve(#[source] io::Error),
}
