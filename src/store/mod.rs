//! The persistence layer
//!
//! Two relational backends sit behind the [`Store`] handle: SQLite and
//! MySQL/MariaDB. Both provision the same two tables and both write with
//! the same update-then-insert algorithm, so re-ingesting a group is
//! idempotent when the upsert flag is on.
//!
//! A `Store` is NOT thread-safe. The worker pool serializes every call
//! through a single writer mutex; nothing else may touch the handle while
//! workers run.

use crate::error::Result;
use crate::types::response::{Group, HeaderFields, OverviewEntry};
use crate::types::ArticleNumber;

mod mysql;
mod sqlite;

pub use self::mysql::MySqlParams;
pub use self::mysql::MySqlStore;
pub use self::sqlite::SqliteStore;

/// Connection parameters for the selected backend
#[derive(Clone, Debug)]
pub enum BackendConfig {
    /// SQLite database file (created on first open)
    Sqlite { path: std::path::PathBuf },
    /// MySQL or MariaDB server
    MySql(MySqlParams),
}

/// A `groups` table row
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GroupRecord {
    pub name: String,
    pub article_count: u32,
    pub first: u32,
    pub last: u32,
}

impl From<&Group> for GroupRecord {
    fn from(group: &Group) -> Self {
        GroupRecord {
            name: group.name.clone(),
            article_count: group.count,
            first: group.low,
            last: group.high,
        }
    }
}

/// An `articles` table row, minus the owning group
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ArticleRecord {
    pub artnum: ArticleNumber,
    pub subject: String,
    pub author: String,
    pub date: String,
    pub message_id: String,
    pub references: String,
    pub bytes: u32,
    pub line_count: u32,
}

impl From<OverviewEntry> for ArticleRecord {
    fn from(entry: OverviewEntry) -> Self {
        ArticleRecord {
            artnum: entry.artnum,
            subject: entry.subject,
            author: entry.author,
            date: entry.date,
            message_id: entry.message_id,
            references: entry.references,
            bytes: entry.bytes,
            line_count: entry.lines,
        }
    }
}

impl ArticleRecord {
    /// Build a record from the parsed header block of `HEAD <artnum>`
    pub fn from_headers(artnum: ArticleNumber, fields: HeaderFields) -> Self {
        ArticleRecord {
            artnum,
            subject: fields.subject,
            author: fields.from,
            date: fields.date,
            message_id: fields.message_id,
            references: fields.references,
            bytes: fields.bytes,
            line_count: fields.lines,
        }
    }
}

/// A handle on the selected backend
///
/// Modelled as a tagged variant rather than a trait object: there are
/// exactly two backends and each has its own connection and statement
/// types.
#[derive(Debug)]
pub enum Store {
    Sqlite(SqliteStore),
    MySql(MySqlStore),
}

impl Store {
    /// Connect to the backend, provision the schema, and prepare the write
    /// statements
    ///
    /// Connection and schema failures are fatal. A statement that cannot be
    /// prepared downgrades the handle to string-formatted SQL with the
    /// backend's escaping routine.
    pub fn open(config: &BackendConfig, upsert: bool) -> Result<Store> {
        match config {
            BackendConfig::Sqlite { path } => {
                SqliteStore::open(path, upsert).map(Store::Sqlite)
            }
            BackendConfig::MySql(params) => MySqlStore::open(params, upsert).map(Store::MySql),
        }
    }

    /// Write a group row (update, then insert when upsert is on)
    ///
    /// Row-level failures are logged and swallowed; they never abort a run.
    pub fn save_group(&mut self, group: &GroupRecord) {
        match self {
            Store::Sqlite(s) => s.save_group(group),
            Store::MySql(s) => s.save_group(group),
        }
    }

    /// Write an article row (update, then insert when upsert is on)
    ///
    /// Row-level failures are logged and swallowed; they never abort a run.
    pub fn save_article(&mut self, group_name: &str, article: &ArticleRecord) {
        match self {
            Store::Sqlite(s) => s.save_article(group_name, article),
            Store::MySql(s) => s.save_article(group_name, article),
        }
    }

    /// All persisted articles of a group, ordered by article number
    pub fn articles_for_group(&mut self, group_name: &str) -> Result<Vec<ArticleRecord>> {
        match self {
            Store::Sqlite(s) => s.articles_for_group(group_name),
            Store::MySql(s) => s.articles_for_group(group_name),
        }
    }

    /// Flush and close the handle
    pub fn close(self) {
        match self {
            Store::Sqlite(s) => s.close(),
            Store::MySql(s) => s.close(),
        }
    }
}
