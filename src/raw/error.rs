use std::net::TcpStream;

/// Low level transport errors
///
/// These cover dialing, TLS, and framing. For protocol level errors see
/// [`crate::error::Error`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Name resolution produced no usable addresses
    #[error("could not resolve {host}:{port} -- {source}")]
    Dns {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    /// Every resolved address candidate refused the connection
    #[error("could not connect to {host}:{port} -- {source}")]
    Connect {
        host: String,
        port: u16,
        source: std::io::Error,
    },
    /// An error propagated from the native TLS implementation
    #[error("TLS error -- {0}")]
    Tls(#[from] native_tls::Error),
    #[error("TLS handshake error -- {0}")]
    TlsHandshake(#[from] native_tls::HandshakeError<TcpStream>),
    /// The server refused the in-band upgrade
    #[error("STARTTLS refused -- {0}")]
    TlsRefused(String),
    /// The peer closed the transport mid-exchange
    #[error("connection closed by server")]
    Closed,
    /// A response line exceeded the read buffer
    ///
    /// Lines are bounded at [`MAX_LINE`](super::connection::MAX_LINE) bytes;
    /// no compliant server sends anything longer.
    #[error("response line exceeded {0} bytes")]
    LineTooLong(usize),
    /// The server returned data that could not be parsed as a status line
    #[error("failed to parse response status line")]
    Parse,
    /// The connection encountered some other I/O error
    #[error("I/O error -- {0}")]
    Io(#[from] std::io::Error),
}

/// A Result returned by the low level API
pub type Result<T> = std::result::Result<T, Error>;
