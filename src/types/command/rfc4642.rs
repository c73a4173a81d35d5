use std::fmt;

use super::NntpCommand;

/// Request an in-band TLS upgrade
///
/// Sending the command is only half of the exchange: on a 382 reply the
/// caller must run the TLS handshake on the same socket, see
/// [`NntpConnection::starttls`](crate::raw::connection::NntpConnection::starttls).
#[derive(Clone, Copy, Debug)]
pub struct StartTls;

impl fmt::Display for StartTls {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "STARTTLS")
    }
}

impl NntpCommand for StartTls {}
