use std::fmt;

use log::*;
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder, Statement};

use crate::error::{Error, Result};
use crate::store::{ArticleRecord, GroupRecord};

// identifiers are backtick-quoted throughout: several column names collide
// with reserved words on MySQL
const CREATE_GROUPS: &str = "CREATE TABLE IF NOT EXISTS `groups` (\
     id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(255) UNIQUE, \
     article_count INT, first INT, last INT) ENGINE=InnoDB";

const CREATE_ARTICLES: &str = "CREATE TABLE IF NOT EXISTS `articles` (\
     id INT AUTO_INCREMENT PRIMARY KEY, `artnum` INT, `subject` TEXT, \
     `author` TEXT, `date` TEXT, `message_id` TEXT, `refs` TEXT, `bytes` INT, \
     `line_count` INT, `group_name` VARCHAR(255), \
     UNIQUE KEY `idx_articles_group_artnum` (`group_name`,`artnum`)) ENGINE=InnoDB";

// upgrades schemas created before the unique key existed; a duplicate-key
// complaint from current schemas is expected and non-fatal
const ADD_UNIQUE_KEY: &str = "ALTER TABLE `articles` \
     ADD UNIQUE KEY `idx_articles_group_artnum` (`group_name`,`artnum`)";

const ARTICLE_UPDATE: &str = "UPDATE `articles` SET `subject`=?, `author`=?, `date`=?, \
     `message_id`=?, `refs`=?, `bytes`=?, `line_count`=? WHERE `group_name`=? AND `artnum`=?";

const ARTICLE_INSERT: &str = "INSERT INTO `articles` (`artnum`, `subject`, `author`, `date`, \
     `message_id`, `refs`, `bytes`, `line_count`, `group_name`) VALUES (?,?,?,?,?,?,?,?,?)";

const GROUP_UPDATE: &str = "UPDATE `groups` SET article_count=?, first=?, last=? WHERE name=?";

const GROUP_INSERT: &str = "INSERT INTO `groups` (name, article_count, first, last) \
     VALUES (?,?,?,?)";

const SELECT_ARTICLES: &str = "SELECT `artnum`, `subject`, `author`, `date`, `message_id`, \
     `refs`, `bytes`, `line_count` FROM `articles` WHERE `group_name`=? ORDER BY `artnum`";

/// Connection parameters for a MySQL/MariaDB server
#[derive(Clone)]
pub struct MySqlParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    /// Database (schema) name
    pub name: String,
    /// Create the database before connecting to it
    pub create_database: bool,
}

// the password must not leak into debug logs
impl fmt::Debug for MySqlParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("pass", &"********")
            .field("name", &self.name)
            .field("create_database", &self.create_database)
            .finish()
    }
}

impl MySqlParams {
    fn opts(&self, with_db: bool) -> Opts {
        let builder = OptsBuilder::new()
            .ip_or_hostname(Some(self.host.clone()))
            .tcp_port(self.port)
            .user(Some(self.user.clone()))
            .pass(Some(self.pass.clone()))
            .db_name(if with_db { Some(self.name.clone()) } else { None });
        Opts::from(builder)
    }
}

#[derive(Debug)]
struct PreparedStatements {
    article_update: Statement,
    article_insert: Statement,
    group_update: Statement,
    group_insert: Statement,
}

/// The MySQL/MariaDB backend
///
/// Prepared [`Statement`]s are owned values and live as long as the handle;
/// when preparation fails the handle degrades to string-formatted SQL with
/// backslash escaping.
pub struct MySqlStore {
    conn: Conn,
    stmts: Option<PreparedStatements>,
    upsert: bool,
}

impl fmt::Debug for MySqlStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlStore")
            .field("prepared", &self.stmts.is_some())
            .field("upsert", &self.upsert)
            .finish()
    }
}

impl MySqlStore {
    pub(crate) fn open(params: &MySqlParams, upsert: bool) -> Result<Self> {
        if params.create_database {
            let mut admin =
                Conn::new(params.opts(false)).map_err(|e| Error::DbConnect(Box::new(e)))?;
            let create = format!(
                "CREATE DATABASE IF NOT EXISTS `{}` CHARACTER SET utf8mb4 \
                 COLLATE utf8mb4_unicode_ci",
                params.name
            );
            if let Err(e) = admin.query_drop(create) {
                warn!("mysql create database error: {}", e);
            }
        }

        let mut conn = Conn::new(params.opts(true)).map_err(|e| Error::DbConnect(Box::new(e)))?;

        conn.query_drop(CREATE_GROUPS)
            .map_err(|e| Error::DbSchema(Box::new(e)))?;
        conn.query_drop(CREATE_ARTICLES)
            .map_err(|e| Error::DbSchema(Box::new(e)))?;
        if let Err(e) = conn.query_drop(ADD_UNIQUE_KEY) {
            info!("mysql index add note: {}", e);
        }

        let stmts = match Self::prepare(&mut conn) {
            Ok(stmts) => Some(stmts),
            Err(e) => {
                warn!("mysql prepare failed, falling back to escaped SQL: {}", e);
                None
            }
        };

        Ok(Self {
            conn,
            stmts,
            upsert,
        })
    }

    fn prepare(conn: &mut Conn) -> std::result::Result<PreparedStatements, mysql::Error> {
        Ok(PreparedStatements {
            article_update: conn.prep(ARTICLE_UPDATE)?,
            article_insert: conn.prep(ARTICLE_INSERT)?,
            group_update: conn.prep(GROUP_UPDATE)?,
            group_insert: conn.prep(GROUP_INSERT)?,
        })
    }

    pub(crate) fn save_group(&mut self, group: &GroupRecord) {
        let updated = match &self.stmts {
            Some(stmts) => self.conn.exec_drop(
                &stmts.group_update,
                (group.article_count, group.first, group.last, group.name.as_str()),
            ),
            None => self.conn.query_drop(format!(
                "UPDATE `groups` SET article_count={}, first={}, last={} WHERE name={}",
                group.article_count,
                group.first,
                group.last,
                escape(&group.name)
            )),
        };

        match updated {
            Ok(()) if self.conn.affected_rows() == 0 => self.insert_group(group),
            Ok(()) => {}
            Err(e) => warn!("mysql group update error: {}", e),
        }
    }

    fn insert_group(&mut self, group: &GroupRecord) {
        if !self.upsert {
            warn!("group not found for update: {}", group.name);
            return;
        }

        let inserted = match &self.stmts {
            Some(stmts) => self.conn.exec_drop(
                &stmts.group_insert,
                (group.name.as_str(), group.article_count, group.first, group.last),
            ),
            None => self.conn.query_drop(format!(
                "INSERT INTO `groups` (name, article_count, first, last) VALUES ({},{},{},{})",
                escape(&group.name),
                group.article_count,
                group.first,
                group.last
            )),
        };

        match inserted {
            Ok(()) => info!("group inserted: {}", group.name),
            Err(e) => warn!("mysql group insert error: {}", e),
        }
    }

    pub(crate) fn save_article(&mut self, group_name: &str, article: &ArticleRecord) {
        let updated = match &self.stmts {
            Some(stmts) => self.conn.exec_drop(
                &stmts.article_update,
                (
                    article.subject.as_str(),
                    article.author.as_str(),
                    article.date.as_str(),
                    article.message_id.as_str(),
                    article.references.as_str(),
                    article.bytes,
                    article.line_count,
                    group_name,
                    article.artnum,
                ),
            ),
            None => self.conn.query_drop(format!(
                "UPDATE `articles` SET `subject`={}, `author`={}, `date`={}, `message_id`={}, \
                 `refs`={}, `bytes`={}, `line_count`={} WHERE `group_name`={} AND `artnum`={}",
                escape(&article.subject),
                escape(&article.author),
                escape(&article.date),
                escape(&article.message_id),
                escape(&article.references),
                article.bytes,
                article.line_count,
                escape(group_name),
                article.artnum
            )),
        };

        match updated {
            Ok(()) if self.conn.affected_rows() == 0 => self.insert_article(group_name, article),
            Ok(()) => {}
            Err(e) => warn!("mysql article update error: {}", e),
        }
    }

    fn insert_article(&mut self, group_name: &str, article: &ArticleRecord) {
        if !self.upsert {
            warn!(
                "article not found for update: {} #{}",
                group_name, article.artnum
            );
            return;
        }

        let inserted = match &self.stmts {
            Some(stmts) => self.conn.exec_drop(
                &stmts.article_insert,
                (
                    article.artnum,
                    article.subject.as_str(),
                    article.author.as_str(),
                    article.date.as_str(),
                    article.message_id.as_str(),
                    article.references.as_str(),
                    article.bytes,
                    article.line_count,
                    group_name,
                ),
            ),
            None => self.conn.query_drop(format!(
                "INSERT INTO `articles` (`artnum`, `subject`, `author`, `date`, `message_id`, \
                 `refs`, `bytes`, `line_count`, `group_name`) VALUES ({},{},{},{},{},{},{},{},{})",
                article.artnum,
                escape(&article.subject),
                escape(&article.author),
                escape(&article.date),
                escape(&article.message_id),
                escape(&article.references),
                article.bytes,
                article.line_count,
                escape(group_name)
            )),
        };

        match inserted {
            Ok(()) => info!("article inserted: {} #{}", group_name, article.artnum),
            Err(e) => warn!("mysql article insert error: {}", e),
        }
    }

    pub(crate) fn articles_for_group(&mut self, group_name: &str) -> Result<Vec<ArticleRecord>> {
        self.conn
            .exec_map(
                SELECT_ARTICLES,
                (group_name,),
                |(artnum, subject, author, date, message_id, references, bytes, line_count)| {
                    ArticleRecord {
                        artnum,
                        subject,
                        author,
                        date,
                        message_id,
                        references,
                        bytes,
                        line_count,
                    }
                },
            )
            .map_err(|e| Error::Runtime(format!("article query failed: {}", e)))
    }

    pub(crate) fn close(self) {
        // statements and the connection clean themselves up on drop
        drop(self);
    }
}

/// MySQL escaping: backslash-escape the special set, wrap in single quotes
///
/// Mirrors what `mysql_real_escape_string` does for the characters that can
/// terminate or alter a quoted literal.
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        match ch {
            '\'' | '"' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{1a}' => out.push_str("\\Z"),
            _ => out.push(ch),
        }
    }
    out.push('\'');
    out
}
