//! # Hiring Orchestrator
//!
//! Runtime half of the hiring orchestrator: configuration, the SQLite
//! store, the HTTP inference client, the HTTP surface and the command
//! implementations behind the `hire` binary. The request state machine
//! itself lives in [`hiring_orchestrator_core`].
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and validation |
//! | [`db`] | SQLite pool (WAL, busy timeout) |
//! | [`migrate`] | Idempotent schema creation |
//! | [`sqlite_store`] | `Store` implementation over SQLite |
//! | [`inference`] | OpenAI-compatible and disabled inference clients |
//! | [`ask`] | Orchestrator wiring and `hire ask` |
//! | [`people`] | `hire people` and `hire stats` |
//! | [`server`] | axum HTTP surface |

pub mod ask;
pub mod config;
pub mod db;
pub mod inference;
pub mod migrate;
pub mod people;
pub mod server;
pub mod sqlite_store;
