use crate::raw;
use crate::types::response_code::ResponseCode;

/// Boxed source for backend errors that come from different crates
pub type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by the archiver
///
/// Transport-level problems are wrapped from [`raw::error::Error`]; the
/// remaining variants are protocol or persistence failures. Every variant
/// maps onto a process exit code via [`exit_code`](Error::exit_code), which
/// is the contract scripts drive the binary through.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Unknown or missing required options (exit 2)
    #[error("invalid arguments -- {0}")]
    Args(String),
    /// Contradictory or invalid option combinations (exit 3)
    #[error("configuration error -- {0}")]
    Config(String),
    /// Error with the underlying connection (exit 10/11/12/30)
    #[error(transparent)]
    Transport(#[from] raw::error::Error),
    /// The server refused the session at greeting time (exit 13)
    #[error("server rejected the session -- {0}")]
    GreetingRejected(String),
    /// A command was rejected by the server (exit 14)
    #[error("{cmd} failed with {code} -- {msg}")]
    CommandFailed {
        cmd: &'static str,
        code: ResponseCode,
        msg: String,
    },
    /// AUTHINFO was rejected (exit 15)
    #[error("authentication failed with {0}")]
    AuthFailed(ResponseCode),
    /// The database could not be opened or connected to (exit 20)
    #[error("database connection failed -- {0}")]
    DbConnect(#[source] BoxedSource),
    /// Schema provisioning failed (exit 21)
    #[error("database schema creation failed -- {0}")]
    DbSchema(#[source] BoxedSource),
    /// Statement preparation failed fatally (exit 22)
    #[error("database prepared statement failed -- {0}")]
    DbPrepare(#[source] BoxedSource),
    /// A response could not be deserialized into its typed form (exit 30)
    #[error("{0}")]
    Deserialization(String),
    /// Any other failure (exit 30)
    #[error("runtime error -- {0}")]
    Runtime(String),
    /// Any other I/O error (exit 30)
    #[error("I/O error -- {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn missing_field(name: impl AsRef<str>) -> Self {
        Error::Deserialization(format!("missing field `{}`", name.as_ref()))
    }

    pub(crate) fn parse_error(name: impl AsRef<str>) -> Self {
        Error::Deserialization(format!("could not parse field `{}`", name.as_ref()))
    }

    /// The process exit code for this error
    pub fn exit_code(&self) -> i32 {
        use crate::raw::error::Error as Raw;

        match self {
            Error::Args(_) => 2,
            Error::Config(_) => 3,
            Error::Transport(Raw::Dns { .. }) => 10,
            Error::Transport(Raw::Connect { .. }) => 11,
            Error::Transport(Raw::Tls(_))
            | Error::Transport(Raw::TlsHandshake(_))
            | Error::Transport(Raw::TlsRefused(_)) => 12,
            Error::Transport(_) => 30,
            Error::GreetingRejected(_) => 13,
            Error::CommandFailed { .. } => 14,
            Error::AuthFailed(_) => 15,
            Error::DbConnect(_) => 20,
            Error::DbSchema(_) => 21,
            Error::DbPrepare(_) => 22,
            Error::Deserialization(_) | Error::Runtime(_) | Error::Io(_) => 30,
        }
    }
}

/// A Result with the crate's [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_documented_contract() {
        assert_eq!(Error::Args("x".into()).exit_code(), 2);
        assert_eq!(Error::Config("x".into()).exit_code(), 3);
        assert_eq!(Error::GreetingRejected("400 go away".into()).exit_code(), 13);
        assert_eq!(
            Error::CommandFailed {
                cmd: "GROUP",
                code: 411.into(),
                msg: "no such group".into(),
            }
            .exit_code(),
            14
        );
        assert_eq!(Error::AuthFailed(481.into()).exit_code(), 15);
        assert_eq!(Error::Deserialization("x".into()).exit_code(), 30);
    }

    #[test]
    fn transport_exit_codes() {
        let dns = raw::error::Error::Dns {
            host: "h".into(),
            port: 119,
            source: std::io::Error::new(std::io::ErrorKind::Other, "nope"),
        };
        assert_eq!(Error::from(dns).exit_code(), 10);

        let connect = raw::error::Error::Connect {
            host: "h".into(),
            port: 119,
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "nope"),
        };
        assert_eq!(Error::from(connect).exit_code(), 11);

        assert_eq!(Error::from(raw::error::Error::Closed).exit_code(), 30);
    }
}
