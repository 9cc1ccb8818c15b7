//! Provider worker communication module.
//!
//! Provider backends run as separate worker processes that own the provider's
//! wire protocol (REST calls, sessions, payload shapes). The report engine
//! talks to them through a small NDJSON protocol.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  reportgen (Rust + Tokio)                       │
//! │  ┌───────────────────────────────────────────────────────────┐  │
//! │  │                 WorkerClient (Async)                      │  │
//! │  │  - Spawns provider worker as child process                │  │
//! │  │  - NDJSON protocol over stdin/stdout                      │  │
//! │  │  - Request IDs for response correlation                   │  │
//! │  └───────────────────────────────────────────────────────────┘  │
//! │               stdin (NDJSON) │ stdout (NDJSON)                  │
//! └──────────────────────────────┼──────────────────────────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │           Provider worker (long-running child process)          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod client;
mod error;
pub mod protocol;

pub use client::{WorkerClient, DEFAULT_TIMEOUT_SECS};
pub use error::{WorkerError, WorkerResult};
