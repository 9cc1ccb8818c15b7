//! Cross-join of dimension rows.
//!
//! Joining `[d0, d1, ..., dn]` yields one row per combination, in the order
//! of `d0` rows, then `d1` rows within each, and so on. Fields of later
//! dimensions overwrite earlier fields of the same name.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::definition::DimensionSpec;
use super::error::{ReportError, ReportResult};
use super::resolver::DimensionResolver;
use crate::metadata::Row;

/// Produces the joined rows of a list of dimensions.
#[async_trait]
pub trait JoinStrategy: Send + Sync {
    async fn join<'r>(
        &self,
        resolver: &DimensionResolver<'r>,
        specs: &[DimensionSpec],
    ) -> ReportResult<Vec<Row>>;
}

/// Resolves the head dimension, then recomputes the join of the remaining
/// dimensions once per head row.
///
/// A join of `n` dimensions therefore resolves the tail once for every
/// combination of the rows before it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecursiveJoin;

#[async_trait]
impl JoinStrategy for RecursiveJoin {
    async fn join<'r>(
        &self,
        resolver: &DimensionResolver<'r>,
        specs: &[DimensionSpec],
    ) -> ReportResult<Vec<Row>> {
        let (head, tail) = split(specs)?;
        let rows = resolver.resolve(head).await?;
        if tail.is_empty() {
            return Ok(rows);
        }

        let mut joined = Vec::new();
        for row in &rows {
            let tail_rows = self.join(resolver, tail).await?;
            joined.extend(tail_rows.into_iter().map(|tail_row| merge(row, tail_row)));
        }
        Ok(joined)
    }
}

/// Resolves every dimension exactly once and folds the cross-product left
/// to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterializedJoin;

#[async_trait]
impl JoinStrategy for MaterializedJoin {
    async fn join<'r>(
        &self,
        resolver: &DimensionResolver<'r>,
        specs: &[DimensionSpec],
    ) -> ReportResult<Vec<Row>> {
        let (head, tail) = split(specs)?;

        let mut joined = resolver.resolve(head).await?;
        for spec in tail {
            let rows = resolver.resolve(spec).await?;
            joined = joined
                .iter()
                .flat_map(|left| rows.iter().map(move |right| merge(left, right.clone())))
                .collect();
        }
        Ok(joined)
    }
}

fn split(specs: &[DimensionSpec]) -> ReportResult<(&DimensionSpec, &[DimensionSpec])> {
    specs
        .split_first()
        .ok_or_else(|| ReportError::invalid("report has no dimensions to join"))
}

/// `left` with every field of `right` set on it.
///
/// Fields already present keep their position, so header order follows the
/// first dimension that introduced a name.
pub fn merge(left: &Row, right: Row) -> Row {
    let mut merged = left.clone();
    for (key, value) in right {
        merged.insert(key, value);
    }
    merged
}

/// Join strategy named in settings or on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinKind {
    #[default]
    Recursive,
    Materialized,
}

impl JoinKind {
    pub fn strategy(self) -> Box<dyn JoinStrategy> {
        match self {
            JoinKind::Recursive => Box::new(RecursiveJoin),
            JoinKind::Materialized => Box::new(MaterializedJoin),
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinKind::Recursive => write!(f, "recursive"),
            JoinKind::Materialized => write!(f, "materialized"),
        }
    }
}
