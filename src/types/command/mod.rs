use std::fmt;

/// A data-structure that represents an NNTP command
///
/// A command is rendered onto the wire via its [`Display`](fmt::Display)
/// implementation; the connection layer appends the CRLF terminator.
///
/// # Example: implementing LISTGROUP
/// ```
/// use std::fmt;
/// use cronkite::types::command::NntpCommand;
///
/// #[derive(Clone, Debug)]
/// pub struct ListGroup(String);
///
/// impl fmt::Display for ListGroup {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "LISTGROUP {}", self.0)
///     }
/// }
///
/// impl NntpCommand for ListGroup {}
///
/// assert_eq!(ListGroup("misc.test".to_string()).to_string(), "LISTGROUP misc.test");
/// ```
pub trait NntpCommand: fmt::Display {}

/// Commands specified in [RFC 3977](https://tools.ietf.org/html/rfc3977#appendix-B)
mod rfc3977;

#[doc(inline)]
pub use rfc3977::*;

/// The XOVER extension from [RFC 2980](https://tools.ietf.org/html/rfc2980)
mod rfc2980;

#[doc(inline)]
pub use rfc2980::*;

/// STARTTLS as specified in [RFC 4642](https://tools.ietf.org/html/rfc4642)
mod rfc4642;

#[doc(inline)]
pub use rfc4642::*;

/// AUTHINFO commands specified in [RFC 4643](https://tools.ietf.org/html/rfc4643)
mod rfc4643;

#[doc(inline)]
pub use rfc4643::*;
