use crate::{Db, Filter, Record, Result, RowsAffected, Transport, stream::StreamExt};
use futures::Stream;

/// How a [`RowSink`] turns each incoming record into a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkMode {
    Insert,
    /// Each record is read as an equality predicate, not a write payload.
    Delete,
    Save {
        /// Fields updated on key conflict, all of them when `None`.
        update_fields: Option<Vec<String>>,
    },
}

/// A record-at-a-time writing adapter over a [`Db`]: feed it records one by
/// one or drain a whole stream into it. Records are processed strictly in
/// order, one statement in flight at a time, and the first failure stops the
/// drain.
pub struct RowSink<'d, T: Transport> {
    db: &'d Db<T>,
    table: String,
    mode: SinkMode,
}

impl<'d, T: Transport + 'static> RowSink<'d, T> {
    pub fn new(db: &'d Db<T>, table: impl Into<String>, mode: SinkMode) -> Self {
        Self {
            db,
            table: table.into(),
            mode,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn mode(&self) -> &SinkMode {
        &self.mode
    }

    /// Process a single record to completion.
    pub async fn send(&mut self, record: Record) -> Result<RowsAffected> {
        match &self.mode {
            SinkMode::Insert => self.db.insert(&self.table, record).await,
            SinkMode::Delete => {
                self.db
                    .delete(&self.table, Filter::from(record))
                    .await
            }
            SinkMode::Save { update_fields } => {
                let fields = update_fields
                    .as_ref()
                    .map(|v| v.iter().map(String::as_str).collect::<Vec<_>>());
                self.db.save(&self.table, record, fields.as_deref()).await
            }
        }
    }

    /// Drain a stream of records, accumulating the effect summaries. Stops at
    /// the first failing record; already processed records stay processed.
    pub async fn send_all(
        &mut self,
        records: impl Stream<Item = Record>,
    ) -> Result<RowsAffected> {
        let mut records = std::pin::pin!(records);
        let mut total = RowsAffected::default();
        while let Some(record) = records.next().await {
            total.extend([self.send(record).await?]);
        }
        Ok(total)
    }
}

impl<T: Transport + 'static> Db<T> {
    /// Sink inserting each record as a new row.
    pub fn insert_sink(&self, table: impl Into<String>) -> RowSink<'_, T> {
        RowSink::new(self, table, SinkMode::Insert)
    }

    /// Sink deleting the rows matching each record's field equalities.
    pub fn delete_sink(&self, table: impl Into<String>) -> RowSink<'_, T> {
        RowSink::new(self, table, SinkMode::Delete)
    }

    /// Sink upserting each record, updating the listed fields on key
    /// conflict (all fields when `None`).
    pub fn save_sink(
        &self,
        table: impl Into<String>,
        update_fields: Option<&[&str]>,
    ) -> RowSink<'_, T> {
        RowSink::new(
            self,
            table,
            SinkMode::Save {
                update_fields: update_fields
                    .map(|v| v.iter().map(|f| (*f).to_owned()).collect()),
            },
        )
    }
}
