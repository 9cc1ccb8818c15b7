//! Report generation.
//!
//! A report is built in four steps:
//!
//! 1. **Resolve** each dimension to rows (`resolver`, `dates`)
//! 2. **Join** the dimensions into their cross-product (`join`)
//! 3. **Link** fact values onto the joined rows (`facts`)
//! 4. **Render** the rows as one flat table or one table per group
//!    (`aggregate`, `render`)
//!
//! [`ReportGenerator`] runs the steps against a provider from the registry.

pub mod aggregate;
pub mod dates;
pub mod definition;
mod error;
pub mod facts;
mod generator;
pub mod join;
pub mod render;
pub mod resolver;

pub use aggregate::NanPolicy;
pub use definition::{
    DataDimension, DateDimension, DimensionSpec, FactParameter, FactSpec, GroupSpec,
    IntervalUnit, ParameterKind, ReportData, ReportDefinition,
};
pub use error::{ReportError, ReportResult};
pub use facts::attach_facts;
pub use generator::{ReportGenerator, ReportOptions};
pub use join::{JoinKind, JoinStrategy, MaterializedJoin, RecursiveJoin};
pub use render::{format_table, render, ReportTable};
pub use resolver::{filter_strategy, DimensionResolver, FilterStrategy, FirstColumnFilter, NoFilter};
