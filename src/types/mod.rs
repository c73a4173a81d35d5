/// Traits and types for NNTP commands
///
/// The [`NntpCommand`](command::NntpCommand) trait can be used to implement
/// commands not provided here; the ingest subset covers `GROUP`, `HEAD`,
/// `XOVER`, `AUTHINFO`, `STARTTLS`, and `QUIT`.
pub mod command;

/// Typed NNTP responses and the overview/header parsers
pub mod response;

/// NNTP response codes
pub mod response_code;

/// The number of an article within a newsgroup
pub type ArticleNumber = u32;

/// Re-exports of common traits and types
pub mod prelude {
    pub use crate::raw::response::StatusLine;

    pub use super::command::NntpCommand;
    pub use super::response::*;
    pub use super::response_code::*;
    pub use super::ArticleNumber;
}
