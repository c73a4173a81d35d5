use std::fmt;
use std::io;
use std::io::{BufRead, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use log::*;
use native_tls::TlsConnector;

use crate::raw::error::{Error, Result};
use crate::raw::parse::{is_end_of_datablock, parse_status_line, unstuff};
use crate::raw::response::StatusLine;
use crate::raw::stream::NntpStream;
use crate::types::command::NntpCommand;

/// Upper bound on a single response line, terminator included
///
/// RFC 3977 keeps initial response lines under 512 bytes; real servers take
/// liberties with overview data, so the cap is a good deal more generous.
pub const MAX_LINE: usize = 8192;

/// TLS configuration for an [`NntpConnection`]
#[derive(Clone)]
pub struct TlsConfig {
    connector: TlsConnector,
    domain: String,
}

impl TlsConfig {
    /// Create a `TlsConfig` from an existing [`TlsConnector`]
    ///
    /// The `domain` is passed to [`TlsConnector::connect`] for certificate
    /// validation during any handshake.
    pub fn new(domain: String, connector: TlsConnector) -> Self {
        Self { connector, domain }
    }

    /// Create a `TlsConfig` with the system default TLS settings
    pub fn default_connector(domain: impl AsRef<str>) -> Result<Self> {
        let connector = TlsConnector::new()?;
        Ok(Self {
            connector,
            domain: domain.as_ref().to_string(),
        })
    }

    /// The [`TlsConnector`] associated with the config
    pub fn connector(&self) -> &TlsConnector {
        &self.connector
    }

    /// The domain used for certificate validation
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsConfig")
            .field("domain", &self.domain)
            .finish()
    }
}

/// A buffered NntpStream
pub type BufNntpStream = io::BufReader<NntpStream>;

/// A raw connection to an NNTP server
///
/// `NntpConnection` is a byte-framed request/response channel. It serializes
/// commands and deserializes response framing (status lines, dot-terminated
/// data blocks, transparency encoding) and knows nothing about NNTP
/// semantics beyond that.
///
/// NNTP is a STATEFUL protocol; connection state such as the selected group
/// lives in the [`NntpClient`](crate::client::NntpClient) that owns the
/// connection.
#[derive(Debug)]
pub struct NntpConnection {
    stream: BufNntpStream,
}

impl NntpConnection {
    /// Connect to an NNTP server
    ///
    /// Resolution returns every address candidate for `host`; each is tried
    /// in order and the first successful connection wins. When `tls` is
    /// provided the socket is wrapped before any bytes are exchanged
    /// (implicit TLS).
    pub fn connect(
        host: &str,
        port: u16,
        tls: Option<&TlsConfig>,
        read_timeout: Option<Duration>,
    ) -> Result<Self> {
        let tcp = dial(host, port)?;
        tcp.set_read_timeout(read_timeout)?;

        let stream: NntpStream = if let Some(tls) = tls {
            trace!("wrapping TcpStream in TLS for {}", tls.domain());
            tls.connector().connect(tls.domain(), tcp)?.into()
        } else {
            trace!("no TLS config provided, continuing in plain text");
            tcp.into()
        };

        Ok(Self {
            stream: io::BufReader::new(stream),
        })
    }

    /// Upgrade the transport to TLS in place
    ///
    /// The caller must have already sent `STARTTLS` and received a positive
    /// reply; the server sends nothing between that reply and the client
    /// handshake, so dropping the read buffer here is safe.
    pub fn starttls(self, tls: &TlsConfig) -> Result<Self> {
        let stream = match self.stream.into_inner() {
            NntpStream::Tcp(tcp) => {
                trace!("negotiating TLS on the existing socket");
                tls.connector().connect(tls.domain(), tcp)?.into()
            }
            already @ NntpStream::Tls(_) => {
                debug!("transport is already TLS, skipping upgrade");
                already
            }
        };

        Ok(Self {
            stream: io::BufReader::new(stream),
        })
    }

    /// Send a command and read the status line of the reply
    pub fn command<C: NntpCommand>(&mut self, command: &C) -> Result<StatusLine> {
        self.send(command)?;
        self.read_status()
    }

    /// Send a command to the server
    ///
    /// A CRLF terminator is appended when the command does not already carry
    /// one; the whole buffer is written and flushed.
    pub fn send<C: NntpCommand>(&mut self, command: &C) -> Result<()> {
        self.send_str(&command.to_string())
    }

    /// Send a raw command line
    ///
    /// This can be used for commands not implemented by the library.
    pub fn send_str(&mut self, command: &str) -> Result<()> {
        let mut buf = Vec::with_capacity(command.len() + 2);
        buf.extend_from_slice(command.as_bytes());
        if !command.ends_with("\r\n") {
            buf.extend_from_slice(b"\r\n");
        }

        let writer = self.stream.get_mut();
        writer.write_all(&buf).map_err(write_error)?;
        writer.flush().map_err(write_error)?;
        Ok(())
    }

    /// Read a single CRLF-terminated line, without the terminator
    pub fn read_line(&mut self) -> Result<String> {
        read_line_bounded(&mut self.stream, MAX_LINE)
    }

    /// Read and parse the status line of a response
    pub fn read_status(&mut self) -> Result<StatusLine> {
        let line = self.read_line()?;
        let code = parse_status_line(&line).ok_or(Error::Parse)?;
        trace!("<< {}", line);
        Ok(StatusLine {
            code: code.into(),
            line,
        })
    }

    /// Read a dot-terminated multi-line data block
    ///
    /// Returns the ordered content lines with transparency encoding
    /// reversed; the terminating `.` line is consumed and not returned.
    pub fn read_multiline(&mut self) -> Result<Vec<String>> {
        read_data_lines(&mut self.stream)
    }

    /// Whether the transport currently runs over TLS
    pub fn is_tls(&self) -> bool {
        self.stream.get_ref().is_tls()
    }

    /// Best-effort shutdown of the underlying transport; idempotent
    pub fn close(&mut self) {
        self.stream.get_mut().shutdown();
    }
}

/// Classify write failures: a torn connection is reported as such
fn write_error(e: io::Error) -> Error {
    match e.kind() {
        io::ErrorKind::WriteZero
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted => Error::Closed,
        _ => Error::Io(e),
    }
}

/// Resolve `host` and connect to the first address candidate that accepts
fn dial(host: &str, port: u16) -> Result<TcpStream> {
    let addrs: Vec<_> = (host, port)
        .to_socket_addrs()
        .map_err(|source| Error::Dns {
            host: host.to_string(),
            port,
            source,
        })?
        .collect();

    if addrs.is_empty() {
        return Err(Error::Dns {
            host: host.to_string(),
            port,
            source: io::Error::new(io::ErrorKind::NotFound, "resolution returned no addresses"),
        });
    }

    let mut last_err = None;
    for addr in &addrs {
        trace!("trying {}", addr);
        match TcpStream::connect(addr) {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                debug!("connect to {} failed: {}", addr, e);
                last_err = Some(e);
            }
        }
    }

    Err(Error::Connect {
        host: host.to_string(),
        port,
        source: last_err
            .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "no candidates attempted")),
    })
}

/// Read one line from the stream, enforcing the `max` content bound
pub(crate) fn read_line_bounded<R: BufRead>(reader: &mut R, max: usize) -> Result<String> {
    let mut buf = Vec::with_capacity(128);
    let n = reader
        .by_ref()
        .take((max + 2) as u64)
        .read_until(b'\n', &mut buf)?;

    if n == 0 {
        return Err(Error::Closed);
    }
    if buf.last() != Some(&b'\n') {
        // no terminator within the window: either the peer went away
        // mid-line or the line is oversized
        return Err(if n >= max + 2 {
            Error::LineTooLong(max)
        } else {
            Error::Closed
        });
    }

    buf.pop();
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    if buf.len() > max {
        return Err(Error::LineTooLong(max));
    }

    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read data block lines until the lone-dot terminator
pub(crate) fn read_data_lines<R: BufRead>(reader: &mut R) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    loop {
        let line = read_line_bounded(reader, MAX_LINE)?;
        if is_end_of_datablock(&line) {
            trace!("read {} data block lines", lines.len());
            return Ok(lines);
        }
        lines.push(unstuff(&line).to_string());
    }
}
