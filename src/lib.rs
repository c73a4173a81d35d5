#![deny(
    missing_debug_implementations,
    rust_2018_idioms,
    unconditional_recursion
)]

//! 📰 cronkite archives NNTP newsgroup headers into a relational store. 📰
//!
//! The pipeline connects to a news server (plain, implicit TLS, or
//! STARTTLS), authenticates, selects a group, and persists article metadata
//! into SQLite or MySQL/MariaDB — either from one bulk `XOVER` sweep or by
//! fanning per-article `HEAD` requests out over a pool of worker sessions.
//!
//! Layering, bottom up:
//!
//! * [`raw`] — byte-framed connections: dialing, TLS, CRLF lines,
//!   dot-terminated data blocks
//! * [`types`] — commands, response codes, and the overview/header parsers
//! * [`client`] — a stateful session: bring-up, `GROUP`, `XOVER`, `HEAD`
//! * [`store`] — the two backends behind one idempotent write algorithm
//! * [`ingest`] — the orchestrator and the worker pool
//! * [`config`] / [`export`] — request assembly and the HTML export pass

/// The high-level client and session bring-up
pub mod client;

/// Request assembly from CLI and config-file values
pub mod config;

/// Error and Result types returned by the cronkite API
pub mod error;

/// HTML export of persisted groups
pub mod export;

/// The end-to-end ingestion pipeline
pub mod ingest;

/// Low level connection/stream APIs
///
/// These deal with raw NNTP connections and response framing. Consider
/// using the higher level [`client`] APIs unless you have special
/// requirements.
pub mod raw;

/// The persistence layer
pub mod store;

/// Types for sending commands and reading responses
pub mod types;
