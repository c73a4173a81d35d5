//! Request assembly: CLI values layered over an optional TOML config file,
//! validated and clamped into an [`IngestionRequest`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::*;
use serde::{Deserialize, Serialize};

use crate::client::TransportMode;
use crate::error::{Error, Result};
use crate::store::{BackendConfig, MySqlParams};

/// Worker pool bounds
pub const MAX_WORKERS: usize = 64;
/// Upper bound on per-article HEAD retries
pub const MAX_RETRIES: u32 = 10;
/// Progress bar width bounds
pub const MIN_PROGRESS_WIDTH: u16 = 5;
pub const MAX_PROGRESS_WIDTH: u16 = 200;

/// How article headers are fetched
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchMode {
    /// One bulk `XOVER` over the whole range, single threaded
    Overview,
    /// One `HEAD` per article, fanned out over the worker pool
    PerArticleHead,
}

/// Everything one ingestion run needs to know
///
/// Assembled by the CLI/config glue; the orchestrator in
/// [`crate::ingest`] consumes it without touching argv or files again.
#[derive(Clone)]
pub struct IngestionRequest {
    pub host: String,
    pub port: u16,
    pub transport: TransportMode,
    /// Username and password; AUTHINFO runs only when both are present
    pub credentials: Option<(String, String)>,
    pub backend: BackendConfig,
    pub group: String,
    pub fetch: FetchMode,
    /// Restrict ingestion to the newest N articles
    pub limit: Option<u32>,
    pub workers: usize,
    pub retries: u32,
    /// Insert rows that were missing when the update matched nothing
    pub upsert: bool,
    pub progress_width: u16,
}

// the password must not leak into debug logs
impl fmt::Debug for IngestionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestionRequest")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("transport", &self.transport)
            .field(
                "credentials",
                &self.credentials.as_ref().map(|(user, _)| (user, "********")),
            )
            .field("backend", &self.backend)
            .field("group", &self.group)
            .field("fetch", &self.fetch)
            .field("limit", &self.limit)
            .field("workers", &self.workers)
            .field("retries", &self.retries)
            .field("upsert", &self.upsert)
            .finish()
    }
}

/// On-disk configuration, all fields optional
///
/// CLI options override anything loaded from the file. The same struct is
/// what `--write-conf` serializes back out.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<bool>,
    pub starttls: Option<bool>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub db_type: Option<String>,
    pub db_name: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    pub group: Option<String>,
    pub headers_only: Option<bool>,
    pub limit: Option<u32>,
    pub threads: Option<usize>,
    pub retries: Option<u32>,
    pub upsert: Option<bool>,
    pub progress_width: Option<u16>,
}

impl FileConfig {
    /// Load a TOML config file
    pub fn load(path: &Path) -> Result<FileConfig> {
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("could not read {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| Error::Config(format!("could not parse {}: {}", path.display(), e)))
    }

    /// Serialize the config back to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string(self)
            .map_err(|e| Error::Config(format!("could not serialize configuration: {}", e)))?;
        fs::write(path, text)?;
        Ok(())
    }
}

/// Option values as collected from the command line, before the config file
/// is folded in and before validation
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub ssl: bool,
    pub starttls: bool,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub db_type: Option<String>,
    pub db_name: Option<String>,
    pub db_host: Option<String>,
    pub db_port: Option<u16>,
    pub db_user: Option<String>,
    pub db_pass: Option<String>,
    pub group: Option<String>,
    pub headers_only: bool,
    pub limit: Option<u32>,
    pub threads: Option<usize>,
    pub retries: Option<u32>,
    pub upsert: bool,
    pub init_db: bool,
    pub progress_width: Option<u16>,
}

impl RequestOptions {
    /// Fold file values underneath the CLI values
    ///
    /// Boolean flags are sticky: once set on either side they stay set.
    pub fn overlay(mut self, file: FileConfig) -> RequestOptions {
        self.host = self.host.or(file.host);
        self.port = self.port.or(file.port);
        self.ssl = self.ssl || file.ssl.unwrap_or(false);
        self.starttls = self.starttls || file.starttls.unwrap_or(false);
        self.user = self.user.or(file.user);
        self.pass = self.pass.or(file.pass);
        self.db_type = self.db_type.or(file.db_type);
        self.db_name = self.db_name.or(file.db_name);
        self.db_host = self.db_host.or(file.db_host);
        self.db_port = self.db_port.or(file.db_port);
        self.db_user = self.db_user.or(file.db_user);
        self.db_pass = self.db_pass.or(file.db_pass);
        self.group = self.group.or(file.group);
        self.headers_only = self.headers_only || file.headers_only.unwrap_or(false);
        self.limit = self.limit.or(file.limit);
        self.threads = self.threads.or(file.threads);
        self.retries = self.retries.or(file.retries);
        self.upsert = self.upsert || file.upsert.unwrap_or(false);
        self.progress_width = self.progress_width.or(file.progress_width);
        self
    }

    /// Validate and clamp the collected options into a request
    pub fn into_request(self) -> Result<IngestionRequest> {
        let transport = match (self.ssl, self.starttls) {
            (true, true) => {
                return Err(Error::Config(
                    "--ssl and --starttls are mutually exclusive".to_string(),
                ));
            }
            (true, false) => TransportMode::DirectTls,
            (false, true) => TransportMode::StartTls,
            (false, false) => TransportMode::Plain,
        };

        let host = self.host.unwrap_or_else(|| "localhost".to_string());
        let port = self.port.unwrap_or_else(|| transport.default_port());

        let group = self
            .group
            .ok_or_else(|| Error::Args("missing required option --group".to_string()))?;
        let db_type = self
            .db_type
            .ok_or_else(|| Error::Args("missing required option --db-type".to_string()))?;
        let db_name = self
            .db_name
            .ok_or_else(|| Error::Args("missing required option --db-name".to_string()))?;

        let backend = match db_type.as_str() {
            "sqlite" => BackendConfig::Sqlite {
                path: PathBuf::from(db_name),
            },
            "mysql" | "mariadb" => BackendConfig::MySql(MySqlParams {
                host: self.db_host.unwrap_or_else(|| "localhost".to_string()),
                port: self.db_port.unwrap_or(3306),
                user: self.db_user.unwrap_or_else(|| "root".to_string()),
                pass: self.db_pass.unwrap_or_default(),
                name: db_name,
                create_database: self.init_db,
            }),
            other => {
                return Err(Error::Args(format!(
                    "unknown db-type (expected sqlite|mariadb|mysql): {}",
                    other
                )));
            }
        };

        let credentials = match (self.user, self.pass) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (Some(_), None) | (None, Some(_)) => {
                warn!("only one of user/pass provided, skipping authentication");
                None
            }
            (None, None) => None,
        };

        // limit 0 disables the window, same as not passing it
        let limit = self.limit.filter(|l| *l > 0);

        let fetch = if self.headers_only {
            FetchMode::Overview
        } else {
            FetchMode::PerArticleHead
        };

        Ok(IngestionRequest {
            host,
            port,
            transport,
            credentials,
            backend,
            group,
            fetch,
            limit,
            workers: self.threads.unwrap_or(1).max(1).min(MAX_WORKERS),
            retries: self.retries.unwrap_or(3).min(MAX_RETRIES),
            upsert: self.upsert,
            progress_width: self
                .progress_width
                .unwrap_or(40)
                .max(MIN_PROGRESS_WIDTH)
                .min(MAX_PROGRESS_WIDTH),
        })
    }

    /// The on-disk representation of the collected options, for `--write-conf`
    pub fn to_file_config(&self) -> FileConfig {
        FileConfig {
            host: self.host.clone(),
            port: self.port,
            ssl: Some(self.ssl),
            starttls: Some(self.starttls),
            user: self.user.clone(),
            pass: self.pass.clone(),
            db_type: self.db_type.clone(),
            db_name: self.db_name.clone(),
            db_host: self.db_host.clone(),
            db_port: self.db_port,
            db_user: self.db_user.clone(),
            db_pass: self.db_pass.clone(),
            group: self.group.clone(),
            headers_only: Some(self.headers_only),
            limit: self.limit,
            threads: self.threads,
            retries: self.retries,
            upsert: Some(self.upsert),
            progress_width: self.progress_width,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> RequestOptions {
        RequestOptions {
            host: Some("news.example.com".to_string()),
            db_type: Some("sqlite".to_string()),
            db_name: Some("news.db".to_string()),
            group: Some("misc.test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn minimal_options_validate() {
        let req = minimal().into_request().unwrap();
        assert_eq!(req.host, "news.example.com");
        assert_eq!(req.port, 119);
        assert_eq!(req.transport, TransportMode::Plain);
        assert_eq!(req.fetch, FetchMode::PerArticleHead);
        assert_eq!(req.workers, 1);
        assert_eq!(req.retries, 3);
        assert!(!req.upsert);
        match req.backend {
            BackendConfig::Sqlite { ref path } => assert_eq!(path.to_str(), Some("news.db")),
            _ => panic!("expected sqlite backend"),
        }
    }

    #[test]
    fn ssl_selects_the_tls_port() {
        let mut opts = minimal();
        opts.ssl = true;
        let req = opts.into_request().unwrap();
        assert_eq!(req.transport, TransportMode::DirectTls);
        assert_eq!(req.port, 563);
    }

    #[test]
    fn ssl_and_starttls_conflict() {
        let mut opts = minimal();
        opts.ssl = true;
        opts.starttls = true;
        match opts.into_request() {
            Err(Error::Config(_)) => {}
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn missing_required_options_are_args_errors() {
        let mut opts = minimal();
        opts.group = None;
        assert!(matches!(opts.into_request(), Err(Error::Args(_))));

        let mut opts = minimal();
        opts.db_type = None;
        assert!(matches!(opts.into_request(), Err(Error::Args(_))));
    }

    #[test]
    fn unknown_db_type_is_an_args_error() {
        let mut opts = minimal();
        opts.db_type = Some("postgres".to_string());
        assert!(matches!(opts.into_request(), Err(Error::Args(_))));
    }

    #[test]
    fn mysql_defaults() {
        let mut opts = minimal();
        opts.db_type = Some("mariadb".to_string());
        let req = opts.into_request().unwrap();
        match req.backend {
            BackendConfig::MySql(ref params) => {
                assert_eq!(params.host, "localhost");
                assert_eq!(params.port, 3306);
                assert_eq!(params.user, "root");
                assert_eq!(params.pass, "");
                assert_eq!(params.name, "news.db");
                assert!(!params.create_database);
            }
            _ => panic!("expected mysql backend"),
        }
    }

    #[test]
    fn workers_and_retries_are_clamped() {
        let mut opts = minimal();
        opts.threads = Some(10_000);
        opts.retries = Some(99);
        let req = opts.into_request().unwrap();
        assert_eq!(req.workers, MAX_WORKERS);
        assert_eq!(req.retries, MAX_RETRIES);

        let mut opts = minimal();
        opts.threads = Some(0);
        assert_eq!(opts.into_request().unwrap().workers, 1);
    }

    #[test]
    fn zero_limit_means_no_limit() {
        let mut opts = minimal();
        opts.limit = Some(0);
        assert_eq!(opts.into_request().unwrap().limit, None);
    }

    #[test]
    fn lone_username_skips_authentication() {
        let mut opts = minimal();
        opts.user = Some("reader".to_string());
        assert!(opts.into_request().unwrap().credentials.is_none());
    }

    #[test]
    fn cli_wins_over_file() {
        let mut cli = minimal();
        cli.port = Some(1119);
        let file = FileConfig {
            port: Some(2119),
            threads: Some(8),
            upsert: Some(true),
            ..Default::default()
        };
        let merged = cli.overlay(file);
        assert_eq!(merged.port, Some(1119));
        assert_eq!(merged.threads, Some(8));
        assert!(merged.upsert);
    }

    #[test]
    fn file_config_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cronkite.toml");

        let config = minimal().to_file_config();
        config.save(&path).unwrap();

        let loaded = FileConfig::load(&path).unwrap();
        assert_eq!(loaded.host, config.host);
        assert_eq!(loaded.db_type, config.db_type);
        assert_eq!(loaded.group, config.group);
        assert_eq!(loaded.headers_only, Some(false));
    }

    #[test]
    fn debug_masks_credentials() {
        let mut opts = minimal();
        opts.user = Some("reader".to_string());
        opts.pass = Some("hunter2".to_string());
        let req = opts.into_request().unwrap();
        assert!(!format!("{:?}", req).contains("hunter2"));
    }
}
