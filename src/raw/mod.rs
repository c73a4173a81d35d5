/// Raw connection implementation
pub mod connection;

/// Low level API errors
pub mod error;

/// Response framing parsers
///
/// * The parsing is line based
/// * Naming conventions follow those in [`nom`]
pub(crate) mod parse;

/// Raw NNTP response types
pub mod response;

/// Raw TCP/TLS stream implementation
pub mod stream;
