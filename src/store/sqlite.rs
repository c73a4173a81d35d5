use std::path::Path;

use log::*;
use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::store::{ArticleRecord, GroupRecord};

const CREATE_GROUPS: &str = "CREATE TABLE IF NOT EXISTS groups (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT UNIQUE, \
     article_count INTEGER, first INTEGER, last INTEGER)";

// `references` and `lines` collide with SQL keywords, hence refs/line_count
const CREATE_ARTICLES: &str = "CREATE TABLE IF NOT EXISTS articles (\
     id INTEGER PRIMARY KEY AUTOINCREMENT, artnum INTEGER, subject TEXT, \
     author TEXT, date TEXT, message_id TEXT, refs TEXT, bytes INTEGER, \
     line_count INTEGER, group_name TEXT)";

const CREATE_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS \
     idx_articles_group_artnum ON articles(group_name, artnum)";

const ARTICLE_UPDATE: &str = "UPDATE articles SET subject=?, author=?, date=?, \
     message_id=?, refs=?, bytes=?, line_count=? WHERE group_name=? AND artnum=?";

const ARTICLE_INSERT: &str = "INSERT INTO articles (artnum, subject, author, date, \
     message_id, refs, bytes, line_count, group_name) VALUES (?,?,?,?,?,?,?,?,?)";

const GROUP_UPDATE: &str = "UPDATE groups SET article_count=?, first=?, last=? WHERE name=?";

const GROUP_INSERT: &str = "INSERT INTO groups (name, article_count, first, last) \
     VALUES (?,?,?,?)";

const SELECT_ARTICLES: &str = "SELECT artnum, subject, author, date, message_id, refs, \
     bytes, line_count FROM articles WHERE group_name=? ORDER BY artnum";

/// The SQLite backend
///
/// Statements are prepared once at open time and retained through
/// rusqlite's statement cache; `prepared` drops to false when preparation
/// fails, switching every write to escaped, string-formatted SQL.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    prepared: bool,
    upsert: bool,
}

impl SqliteStore {
    pub(crate) fn open(path: &Path, upsert: bool) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| Error::DbConnect(Box::new(e)))?;

        for sql in &[CREATE_GROUPS, CREATE_ARTICLES, CREATE_INDEX] {
            conn.execute_batch(sql)
                .map_err(|e| Error::DbSchema(Box::new(e)))?;
        }

        conn.set_prepared_statement_cache_capacity(8);
        let mut prepared = true;
        for sql in &[ARTICLE_UPDATE, ARTICLE_INSERT, GROUP_UPDATE, GROUP_INSERT] {
            if let Err(e) = conn.prepare_cached(sql) {
                warn!("sqlite prepare failed, falling back to escaped SQL: {}", e);
                prepared = false;
                break;
            }
        }

        Ok(Self {
            conn,
            prepared,
            upsert,
        })
    }

    pub(crate) fn save_group(&mut self, group: &GroupRecord) {
        let affected = if self.prepared {
            self.conn.prepare_cached(GROUP_UPDATE).and_then(|mut stmt| {
                stmt.execute(params![
                    group.article_count,
                    group.first,
                    group.last,
                    group.name
                ])
            })
        } else {
            self.conn.execute(
                &format!(
                    "UPDATE groups SET article_count={}, first={}, last={} WHERE name={}",
                    group.article_count,
                    group.first,
                    group.last,
                    escape(&group.name)
                ),
                [],
            )
        };

        match affected {
            Ok(0) => self.insert_group(group),
            Ok(_) => {}
            Err(e) => warn!("sqlite group update failed: {}", e),
        }
    }

    fn insert_group(&mut self, group: &GroupRecord) {
        if !self.upsert {
            warn!("group not found for update: {}", group.name);
            return;
        }

        let inserted = if self.prepared {
            self.conn.prepare_cached(GROUP_INSERT).and_then(|mut stmt| {
                stmt.execute(params![
                    group.name,
                    group.article_count,
                    group.first,
                    group.last
                ])
            })
        } else {
            self.conn.execute(
                &format!(
                    "INSERT INTO groups (name, article_count, first, last) VALUES ({},{},{},{})",
                    escape(&group.name),
                    group.article_count,
                    group.first,
                    group.last
                ),
                [],
            )
        };

        match inserted {
            Ok(_) => info!("group inserted: {}", group.name),
            Err(e) => warn!("sqlite group insert failed: {}", e),
        }
    }

    pub(crate) fn save_article(&mut self, group_name: &str, article: &ArticleRecord) {
        let affected = if self.prepared {
            self.conn.prepare_cached(ARTICLE_UPDATE).and_then(|mut stmt| {
                stmt.execute(params![
                    article.subject,
                    article.author,
                    article.date,
                    article.message_id,
                    article.references,
                    article.bytes,
                    article.line_count,
                    group_name,
                    article.artnum
                ])
            })
        } else {
            self.conn.execute(
                &format!(
                    "UPDATE articles SET subject={}, author={}, date={}, message_id={}, \
                     refs={}, bytes={}, line_count={} WHERE group_name={} AND artnum={}",
                    escape(&article.subject),
                    escape(&article.author),
                    escape(&article.date),
                    escape(&article.message_id),
                    escape(&article.references),
                    article.bytes,
                    article.line_count,
                    escape(group_name),
                    article.artnum
                ),
                [],
            )
        };

        match affected {
            Ok(0) => self.insert_article(group_name, article),
            Ok(_) => {}
            Err(e) => warn!("sqlite article update failed: {}", e),
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

        let inserted = if self.prepared {
            self.conn.prepare_cached(ARTICLE_INSERT).and_then(|mut stmt| {
                stmt.execute(params![
                    article.artnum,
                    article.subject,
                    article.author,
                    article.date,
                    article.message_id,
                    article.references,
                    article.bytes,
                    article.line_count,
                    group_name
                ])
            })
        } else {
            self.conn.execute(
                &format!(
                    "INSERT INTO articles (artnum, subject, author, date, message_id, refs, \
                     bytes, line_count, group_name) VALUES ({},{},{},{},{},{},{},{},{})",
                    article.artnum,
                    escape(&article.subject),
                    escape(&article.author),
                    escape(&article.date),
                    escape(&article.message_id),
                    escape(&article.references),
                    article.bytes,
                    article.line_count,
                    escape(group_name)
                ),
                [],
            )
        };

        match inserted {
            Ok(_) => info!("article inserted: {} #{}", group_name, article.artnum),
            Err(e) => warn!("sqlite article insert failed: {}", e),
        }
    }

    pub(crate) fn articles_for_group(&mut self, group_name: &str) -> Result<Vec<ArticleRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(SELECT_ARTICLES)
            .map_err(|e| Error::Runtime(format!("article query failed: {}", e)))?;

        let rows = stmt
            .query_map(params![group_name], |row| {
                Ok(ArticleRecord {
                    artnum: row.get(0)?,
                    subject: row.get(1)?,
                    author: row.get(2)?,
                    date: row.get(3)?,
                    message_id: row.get(4)?,
                    references: row.get(5)?,
                    bytes: row.get(6)?,
                    line_count: row.get(7)?,
                })
            })
            .map_err(|e| Error::Runtime(format!("article query failed: {}", e)))?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Runtime(format!("article row failed: {}", e)))
    }

    pub(crate) fn close(self) {
        if let Err((_conn, e)) = self.conn.close() {
            warn!("sqlite close failed: {}", e);
        }
    }
}

/// SQLite escaping: double embedded single quotes, wrap in single quotes
pub(crate) fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for ch in s.chars() {
        if ch == '\'' {
            out.push('\'');
        }
        out.push(ch);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store(upsert: bool) -> SqliteStore {
        SqliteStore::open(Path::new(":memory:"), upsert).unwrap()
    }

    fn article(artnum: u32, subject: &str) -> ArticleRecord {
        ArticleRecord {
            artnum,
            subject: subject.to_string(),
            author: "a@example.com".to_string(),
            date: "1 Jan 2020 00:00:00 GMT".to_string(),
            message_id: format!("<{}@example.com>", artnum),
            references: String::new(),
            bytes: 100,
            line_count: 10,
        }
    }

    #[test]
    fn upsert_inserts_missing_rows() {
        let mut store = memory_store(true);
        store.save_article("misc.test", &article(1, "hello"));

        let rows = store.articles_for_group("misc.test").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject, "hello");
    }

    #[test]
    fn reingest_is_idempotent() {
        let mut store = memory_store(true);
        let a = article(1, "hello");
        store.save_article("misc.test", &a);
        store.save_article("misc.test", &a);

        let rows = store.articles_for_group("misc.test").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0], a);
    }

    #[test]
    fn update_replaces_values() {
        let mut store = memory_store(true);
        store.save_article("misc.test", &article(1, "first pass"));
        store.save_article("misc.test", &article(1, "second pass"));

        let rows = store.articles_for_group("misc.test").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject, "second pass");
    }

    #[test]
    fn without_upsert_missing_rows_stay_missing() {
        let mut store = memory_store(false);
        store.save_article("misc.test", &article(5, "never lands"));
        assert!(store.articles_for_group("misc.test").unwrap().is_empty());
    }

    #[test]
    fn same_artnum_in_another_group_is_a_separate_row() {
        let mut store = memory_store(true);
        store.save_article("misc.test", &article(1, "one"));
        store.save_article("alt.test", &article(1, "two"));

        assert_eq!(store.articles_for_group("misc.test").unwrap().len(), 1);
        assert_eq!(store.articles_for_group("alt.test").unwrap().len(), 1);
    }

    #[test]
    fn unique_index_rejects_duplicate_inserts() {
        let store = memory_store(true);
        let insert = "INSERT INTO articles (artnum, subject, author, date, message_id, refs, \
             bytes, line_count, group_name) VALUES (1,'s','a','d','m','r',0,0,'misc.test')";
        store.conn.execute(insert, []).unwrap();
        assert!(store.conn.execute(insert, []).is_err());
    }

    #[test]
    fn group_rows_update_in_place() {
        let mut store = memory_store(true);
        store.save_group(&GroupRecord {
            name: "misc.test".to_string(),
            article_count: 3,
            first: 1,
            last: 3,
        });
        store.save_group(&GroupRecord {
            name: "misc.test".to_string(),
            article_count: 5,
            first: 1,
            last: 5,
        });

        let (count, last): (u32, u32) = store
            .conn
            .query_row(
                "SELECT article_count, last FROM groups WHERE name='misc.test'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 5);
        assert_eq!(last, 5);

        let groups: u32 = store
            .conn
            .query_row("SELECT COUNT(*) FROM groups", [], |row| row.get(0))
            .unwrap();
        assert_eq!(groups, 1);
    }

    #[test]
    fn escaped_fallback_survives_hostile_strings() {
        let mut store = memory_store(true);
        store.prepared = false;

        let mut a = article(1, "it's a 'quoted' subject");
        a.author = "Robert'); DROP TABLE articles;--".to_string();
        store.save_article("misc.test", &a);

        let rows = store.articles_for_group("misc.test").unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].subject, "it's a 'quoted' subject");
        assert_eq!(rows[0].author, "Robert'); DROP TABLE articles;--");
    }

    #[test]
    fn escape_doubles_quotes() {
        assert_eq!(escape("plain"), "'plain'");
        assert_eq!(escape("it's"), "'it''s'");
        assert_eq!(escape(""), "''");
    }
}
