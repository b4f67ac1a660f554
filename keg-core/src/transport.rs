use crate::{Result, RowLabeled, RowsAffected};
use futures::Stream;
use std::future::Future;

/// Reply of a one-shot execution: the rows of a read or the effect summary
/// of a write (possibly both, depending on the backend).
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub rows: Vec<RowLabeled>,
    pub affected: RowsAffected,
}

impl Reply {
    pub fn rows(rows: Vec<RowLabeled>) -> Self {
        Self {
            rows,
            affected: RowsAffected::default(),
        }
    }
    pub fn affected(rows_affected: u64, last_insert_id: Option<i64>) -> Self {
        Self {
            rows: Vec::new(),
            affected: RowsAffected {
                rows_affected,
                last_insert_id,
            },
        }
    }
}

/// The physical execution seam: something that can run final SQL text
/// against a database and hand back rows or an effect summary.
///
/// Pooling, reconnects, retries and timeouts all live behind this trait;
/// this layer passes compiled text through and never inspects the
/// connection. Implementations receive their configuration verbatim at
/// construction time.
pub trait Transport: Send + Sync {
    /// Run one statement to completion.
    fn execute(&self, sql: &str) -> impl Future<Output = Result<Reply>> + Send;

    /// Streaming variant: lazily produced rows straight from the backend,
    /// used by the raw-row streaming mode which bypasses the stage pipeline.
    fn fetch(&self, sql: &str) -> impl Stream<Item = Result<RowLabeled>> + Send;
}

impl<T: Transport> Transport for &T {
    fn execute(&self, sql: &str) -> impl Future<Output = Result<Reply>> + Send {
        (*self).execute(sql)
    }
    fn fetch(&self, sql: &str) -> impl Stream<Item = Result<RowLabeled>> + Send {
        (*self).fetch(sql)
    }
}
