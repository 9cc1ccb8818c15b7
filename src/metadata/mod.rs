//! Provider metadata module.
//!
//! This module holds the provider catalog types, the Provider capability
//! trait, its worker-backed implementation, the provider registry and the
//! version-gated synchronizer that keeps a provider's snapshot current.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ProviderRegistry                           │
//! │  name -> RegisteredProvider { provider, store, snapshot }       │
//! └─────────────────────────────────────────────────────────────────┘
//!                 │ init_provider()                │ snapshot()
//!                 ▼                                ▼
//! ┌───────────────────────────────┐   ┌─────────────────────────────┐
//! │  sync()                       │   │  ReportGenerator            │
//! │  Provider  ──►  MetadataStore │   │  (read-only snapshot)       │
//! │  version written last         │   │                             │
//! └───────────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use reportgen::metadata::{ProviderRegistry, WorkerProvider};
//!
//! let mut registry = ProviderRegistry::new();
//! registry.register("voyanta", Arc::new(provider), Arc::new(store));
//! registry.init_provider("voyanta", &credential).await?;
//! ```

mod provider;
mod registry;
mod sync;
mod types;
mod worker_provider;

pub use provider::{Provider, ProviderResult};
pub use registry::{ProviderRegistry, RegisteredProvider};
pub use sync::{sync, SyncOutcome};
pub use types::*;
pub use worker_provider::WorkerProvider;
