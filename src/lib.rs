//! # reportgen
//!
//! Report generation over external analytical data providers.
//!
//! ## Architecture
//!
//! A provider exposes a versioned catalog (dimensions, facts, filter
//! operators) plus dimension rows and fact values. Reports are declared as
//! JSON and built from that catalog:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              Provider (worker process, NDJSON)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [metadata::sync]
//! ┌─────────────────────────────────────────────────────────┐
//! │        MetadataSnapshot  ◄──►  MetadataStore (SQLite)    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::resolver + report::join]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Joined dimension rows (cross-product)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::facts]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Rows with fact values                    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report::render]
//! ┌─────────────────────────────────────────────────────────┐
//! │          ReportTable (flat, or one per group)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cache;
pub mod config;
pub mod metadata;
pub mod report;
pub mod worker;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::cache::{CachedMetadataStore, MetadataCache, MetadataStore};
    pub use crate::config::{Credential, Settings};
    pub use crate::metadata::{
        MetadataSnapshot, ParameterMap, Provider, ProviderRegistry, Row, SyncOutcome,
        WorkerProvider,
    };
    pub use crate::report::{
        JoinKind, NanPolicy, ReportDefinition, ReportError, ReportGenerator, ReportOptions,
        ReportResult, ReportTable,
    };
}

pub use report::{ReportDefinition, ReportError, ReportGenerator, ReportResult, ReportTable};
