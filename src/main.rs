use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::process;

use log::*;
use structopt::StructOpt;

use cronkite::config::{FileConfig, RequestOptions};
use cronkite::error::Error;
use cronkite::export;
use cronkite::ingest;
use cronkite::store::Store;

/// Archive NNTP newsgroup headers into SQLite or MySQL/MariaDB
#[derive(Debug, StructOpt)]
#[structopt(name = "cronkite")]
struct Opt {
    /// NNTP server host
    #[structopt(long)]
    host: Option<String>,

    /// NNTP server port (default 119, or 563 with --ssl)
    #[structopt(long)]
    port: Option<u16>,

    /// Connect with implicit TLS
    #[structopt(long)]
    ssl: bool,

    /// Upgrade the connection in band with STARTTLS
    #[structopt(long)]
    starttls: bool,

    /// Username for AUTHINFO
    #[structopt(long)]
    user: Option<String>,

    /// Password for AUTHINFO
    #[structopt(long)]
    pass: Option<String>,

    /// Backend: sqlite, mysql, or mariadb
    #[structopt(long = "db-type")]
    db_type: Option<String>,

    /// Database name (file path for sqlite)
    #[structopt(long = "db-name")]
    db_name: Option<String>,

    /// Database server host (mysql)
    #[structopt(long = "db-host")]
    db_host: Option<String>,

    /// Database server port (mysql)
    #[structopt(long = "db-port")]
    db_port: Option<u16>,

    /// Database user (mysql)
    #[structopt(long = "db-user")]
    db_user: Option<String>,

    /// Database password (mysql)
    #[structopt(long = "db-pass")]
    db_pass: Option<String>,

    /// Newsgroup to ingest
    #[structopt(long)]
    group: Option<String>,

    /// Bulk XOVER instead of per-article HEAD
    #[structopt(long = "headers-only")]
    headers_only: bool,

    /// Only ingest the newest N articles
    #[structopt(long)]
    limit: Option<u32>,

    /// Worker sessions for HEAD mode (1-64)
    #[structopt(long)]
    threads: Option<usize>,

    /// Per-article HEAD retries (0-10)
    #[structopt(long)]
    retries: Option<u32>,

    /// Insert rows that are missing when the update matches nothing
    #[structopt(long)]
    upsert: bool,

    /// Create the MySQL database before connecting
    #[structopt(long = "init-db")]
    init_db: bool,

    /// Create the database and schema, then exit without ingesting
    #[structopt(long = "create-db")]
    create_db: bool,

    /// Progress bar width (5-200)
    #[structopt(long = "progress-width")]
    progress_width: Option<u16>,

    /// Load settings from a TOML config file (CLI values win)
    #[structopt(long, parse(from_os_str))]
    conf: Option<PathBuf>,

    /// Save the collected settings to a TOML file and exit
    #[structopt(long = "write-conf", parse(from_os_str))]
    write_conf: Option<PathBuf>,

    /// Append log output to a file instead of stderr
    #[structopt(long, parse(from_os_str))]
    log: Option<PathBuf>,

    /// Verbose logging
    #[structopt(long)]
    verbose: bool,

    /// After the run, export the group as an HTML page to this path
    #[structopt(long = "export-html", parse(from_os_str))]
    export_html: Option<PathBuf>,
}

impl Opt {
    fn to_options(&self) -> RequestOptions {
        RequestOptions {
            host: self.host.clone(),
            port: self.port,
            ssl: self.ssl,
            starttls: self.starttls,
            user: self.user.clone(),
            pass: self.pass.clone(),
            db_type: self.db_type.clone(),
            db_name: self.db_name.clone(),
            db_host: self.db_host.clone(),
            db_port: self.db_port,
            db_user: self.db_user.clone(),
            db_pass: self.db_pass.clone(),
            group: self.group.clone(),
            headers_only: self.headers_only,
            limit: self.limit,
            threads: self.threads,
            retries: self.retries,
            upsert: self.upsert,
            init_db: self.init_db || self.create_db,
            progress_width: self.progress_width,
        }
    }
}

fn main() {
    let opt = match Opt::from_iter_safe(std::env::args()) {
        Ok(opt) => opt,
        Err(e) if e.use_stderr() => {
            eprintln!("{}", e.message);
            process::exit(2);
        }
        // --help and --version land here and exit 0
        Err(e) => e.exit(),
    };

    init_logging(opt.verbose, opt.log.as_deref());
    info!("starting cronkite");

    let mut options = opt.to_options();
    if let Some(conf) = &opt.conf {
        match FileConfig::load(conf) {
            Ok(file) => options = options.overlay(file),
            Err(e) => fail(&e),
        }
    }

    if let Some(path) = &opt.write_conf {
        if let Err(e) = options.to_file_config().save(path) {
            fail(&e);
        }
        println!("Configuration written to {}", path.display());
        return;
    }

    let request = match options.into_request() {
        Ok(request) => request,
        Err(e) => fail(&e),
    };
    debug!("effective request: {:?}", request);

    if opt.create_db {
        match Store::open(&request.backend, request.upsert) {
            Ok(store) => {
                store.close();
                println!("Database and schema created");
                return;
            }
            Err(e) => fail(&e),
        }
    }

    if let Err(e) = ingest::run(&request) {
        fail(&e);
    }

    if let Some(path) = &opt.export_html {
        if let Err(e) = export_pass(&request, path) {
            fail(&e);
        }
    }
}

/// Reopen the store after the run and write the HTML page
fn export_pass(request: &cronkite::config::IngestionRequest, path: &Path) -> Result<(), Error> {
    let mut store = Store::open(&request.backend, request.upsert)?;
    let result = export::export_group_html(&mut store, &request.group, path);
    store.close();
    result
}

fn init_logging(verbose: bool, log_file: Option<&Path>) {
    let env = env_logger::Env::default()
        .default_filter_or(if verbose { "debug" } else { "info" });
    let mut builder = env_logger::Builder::from_env(env);

    if let Some(path) = log_file {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Could not open log file {}: {}", path.display(), e),
        }
    }

    builder.init();
}

fn fail(e: &Error) -> ! {
    error!("{}", e);
    eprintln!("Error (code {}): {}", e.exit_code(), e);
    process::exit(e.exit_code());
}
