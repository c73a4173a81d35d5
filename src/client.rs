use std::convert::TryFrom;
use std::time::Duration;

use log::*;

use crate::error::{Error, Result};
use crate::raw::connection::{NntpConnection, TlsConfig};
use crate::types::command as cmd;
use crate::types::prelude::*;
use crate::types::response_code::Kind;

/// How the TCP transport is (or becomes) encrypted
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TransportMode {
    /// Plain text for the whole session
    Plain,
    /// TLS from the first byte (implicit TLS, usually port 563)
    DirectTls,
    /// Plain connect, then an in-band `STARTTLS` upgrade
    StartTls,
}

impl TransportMode {
    /// The conventional port for the mode
    pub fn default_port(self) -> u16 {
        match self {
            TransportMode::DirectTls => 563,
            TransportMode::Plain | TransportMode::StartTls => 119,
        }
    }
}

/// A client
///
/// Each client represents a single connection with its own protocol state.
/// NNTP is a STATEFUL protocol: the selected group lives on the session, so
/// a client must never be shared between workers.
#[derive(Debug)]
pub struct NntpClient {
    conn: NntpConnection,
    group: Option<Group>,
}

impl NntpClient {
    /// The last selected group
    pub fn group(&self) -> Option<&Group> {
        self.group.as_ref()
    }

    /// Select a newsgroup
    pub fn select_group(&mut self, name: impl AsRef<str>) -> Result<Group> {
        let resp = self
            .conn
            .command(&cmd::Group(name.as_ref().to_string()))?;

        if !resp.code().is_success() {
            return Err(Error::CommandFailed {
                cmd: "GROUP",
                code: resp.code(),
                msg: resp.line().to_string(),
            });
        }

        let group = Group::try_from(&resp)?;
        debug!(
            "selected {}: {} articles in [{}, {}]",
            group.name, group.count, group.low, group.high
        );
        self.group = Some(group.clone());
        Ok(group)
    }

    /// Fetch overview data for an article range
    ///
    /// A rejected `XOVER` is not fatal: the rejection is logged and an empty
    /// block returned, matching how callers treat servers without the
    /// extension.
    pub fn overview(&mut self, low: ArticleNumber, high: ArticleNumber) -> Result<Vec<String>> {
        debug_assert!(self.group.is_some(), "XOVER issued with no group selected");

        let resp = self.conn.command(&cmd::XOver::Range { low, high })?;
        if !resp.code().is_success() {
            warn!("XOVER rejected: {}", resp.line());
            return Ok(Vec::new());
        }
        self.conn.read_multiline().map_err(Error::from)
    }

    /// Fetch the header block for one article
    ///
    /// Returns `None` when the server rejects the article (missing,
    /// cancelled, ...); the caller decides whether to retry.
    pub fn head(&mut self, artnum: ArticleNumber) -> Result<Option<Vec<String>>> {
        debug_assert!(self.group.is_some(), "HEAD issued with no group selected");

        let resp = self.conn.command(&cmd::Head::Number(artnum))?;
        if !resp.code().is_success() {
            warn!("HEAD rejected for {}: {}", artnum, resp.line());
            return Ok(None);
        }
        self.conn.read_multiline().map(Some).map_err(Error::from)
    }

    /// Politely end the session
    ///
    /// Best effort: the `QUIT` exchange and the transport shutdown may both
    /// fail on an already-dead session, which is fine.
    pub fn quit(mut self) {
        if self.conn.command(&cmd::Quit).is_err() {
            trace!("QUIT exchange failed, closing anyway");
        }
        self.conn.close();
    }
}

/// Configuration for an [`NntpClient`]
///
/// `connect` runs the whole session bring-up: dial, optional TLS, greeting,
/// optional STARTTLS upgrade, optional AUTHINFO, optional initial GROUP.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    host: String,
    port: u16,
    transport: TransportMode,
    authinfo: Option<(String, String)>,
    group: Option<String>,
    read_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Start building a config for the given server
    pub fn new(host: impl AsRef<str>, port: u16) -> Self {
        Self {
            host: host.as_ref().to_string(),
            port,
            transport: TransportMode::Plain,
            authinfo: None,
            group: None,
            read_timeout: None,
        }
    }

    /// Select the transport mode
    pub fn transport(&mut self, mode: TransportMode) -> &mut Self {
        self.transport = mode;
        self
    }

    /// Perform an AUTHINFO USER/PASS exchange after connecting
    ///
    /// <https://tools.ietf.org/html/rfc4643#section-2.3>
    pub fn authinfo_user_pass(&mut self, username: String, password: String) -> &mut Self {
        self.authinfo = Some((username, password));
        self
    }

    /// Join a group as the final step of the bring-up
    ///
    /// With `None` no `GROUP` command is sent at connect time.
    pub fn group(&mut self, name: Option<impl AsRef<str>>) -> &mut Self {
        self.group = name.map(|s| s.as_ref().to_string());
        self
    }

    /// The read timeout of the underlying socket
    pub fn read_timeout(&mut self, duration: Option<Duration>) -> &mut Self {
        self.read_timeout = duration;
        self
    }

    /// Resolve the configuration into a connected, authenticated client
    pub fn connect(&self) -> Result<NntpClient> {
        let tls_config = match self.transport {
            TransportMode::Plain => None,
            TransportMode::DirectTls | TransportMode::StartTls => {
                Some(TlsConfig::default_connector(&self.host).map_err(Error::from)?)
            }
        };

        let direct = if self.transport == TransportMode::DirectTls {
            tls_config.as_ref()
        } else {
            None
        };
        let mut conn =
            NntpConnection::connect(&self.host, self.port, direct, self.read_timeout)?;

        let greeting = conn.read_status()?;
        if greeting.code().is_failure() {
            return Err(Error::GreetingRejected(greeting.line().to_string()));
        }
        debug!("connected, server returned `{}`", greeting.line());

        if self.transport == TransportMode::StartTls {
            conn = starttls(conn, tls_config.as_ref())?;
        }

        if let Some((username, password)) = &self.authinfo {
            if !conn.is_tls() {
                warn!("TLS is not enabled, credentials will be sent in the clear!");
            }
            authenticate(&mut conn, username, password)?;
        }

        let mut client = NntpClient { conn, group: None };

        if let Some(name) = &self.group {
            client.select_group(name)?;
        }

        Ok(client)
    }
}

/// Run the STARTTLS exchange and upgrade the transport in place
fn starttls(mut conn: NntpConnection, tls_config: Option<&TlsConfig>) -> Result<NntpConnection> {
    debug!("sending STARTTLS");
    let resp = conn.command(&cmd::StartTls)?;

    // RFC 4642 answers 382, some servers answer with a generic 2xx
    let accepted = resp.code().is_success() || resp.code() == Kind::ContinueWithTls.into();
    if !accepted {
        return Err(Error::Transport(crate::raw::error::Error::TlsRefused(
            resp.line().to_string(),
        )));
    }

    let tls_config = tls_config.ok_or_else(|| {
        Error::Config("STARTTLS requested without a TLS configuration".to_string())
    })?;

    conn.starttls(tls_config).map_err(Error::from)
}

/// Perform an AUTHINFO USER/PASS exchange
fn authenticate(
    conn: &mut NntpConnection,
    username: impl AsRef<str>,
    password: impl AsRef<str>,
) -> Result<()> {
    debug!("sending AUTHINFO USER");
    let user_resp = conn.command(&cmd::AuthInfo::User(username.as_ref().to_string()))?;

    let final_resp = if user_resp.code() == Kind::PasswordRequired.into() {
        debug!("sending AUTHINFO PASS");
        conn.command(&cmd::AuthInfo::Pass(password.as_ref().to_string()))?
    } else {
        user_resp
    };

    if final_resp.code().is_failure() {
        return Err(Error::AuthFailed(final_resp.code()));
    }
    debug!("successfully authenticated");

    Ok(())
}
