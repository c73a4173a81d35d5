use std::io;
use std::io::{Read, Write};
use std::net::{Shutdown, TcpStream};

use native_tls::TlsStream;

/// A raw NNTP session transport
///
/// The stream starts out as plain TCP and may be swapped for TLS either at
/// connect time or after a `STARTTLS` exchange.
#[derive(Debug)]
pub enum NntpStream {
    Tls(Box<TlsStream<TcpStream>>),
    Tcp(TcpStream),
}

impl NntpStream {
    /// Best-effort shutdown of the transport
    ///
    /// TLS close-notify and socket shutdown failures are ignored; calling
    /// this on an already closed stream is fine.
    pub fn shutdown(&mut self) {
        match self {
            NntpStream::Tls(s) => {
                let _ = s.shutdown();
                let _ = s.get_ref().shutdown(Shutdown::Both);
            }
            NntpStream::Tcp(s) => {
                let _ = s.shutdown(Shutdown::Both);
            }
        }
    }

    /// The underlying TCP stream
    pub fn tcp(&self) -> &TcpStream {
        match self {
            NntpStream::Tls(s) => s.get_ref(),
            NntpStream::Tcp(s) => s,
        }
    }

    /// Whether TLS is active on the transport
    pub fn is_tls(&self) -> bool {
        match self {
            NntpStream::Tls(_) => true,
            NntpStream::Tcp(_) => false,
        }
    }
}

impl From<TlsStream<TcpStream>> for NntpStream {
    fn from(stream: TlsStream<TcpStream>) -> Self {
        Self::Tls(Box::new(stream))
    }
}

impl From<TcpStream> for NntpStream {
    fn from(stream: TcpStream) -> NntpStream {
        Self::Tcp(stream)
    }
}

impl Read for NntpStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            NntpStream::Tls(s) => s.read(buf),
            NntpStream::Tcp(s) => s.read(buf),
        }
    }
}

impl Write for NntpStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            NntpStream::Tls(s) => s.write(buf),
            NntpStream::Tcp(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            NntpStream::Tls(s) => s.flush(),
            NntpStream::Tcp(s) => s.flush(),
        }
    }
}
