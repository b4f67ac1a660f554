use crate::{
    AggregateFunc, ColumnDef, Error, Filter, Flow, KEY_FIELD, MySqlWriter, QueryContext,
    QueryOutput, Record, Result, RowLabeled, RowsAffected, Select, SelectSource, SqlWriter, Stage,
    StageFilter, Statement, Transport, Unpack, Value,
    stream::Stream,
};
use async_stream::try_stream;
use futures::future::BoxFuture;
use uuid::Uuid;

/// Generates a unique schema object name with the given prefix; used for
/// auto-named tables and the duplication scratch table.
pub fn unique_name(prefix: &str) -> String {
    format!("{}{}", prefix, Uuid::new_v4().simple())
}

/// The data access layer: operation builders on top of a stage pipeline on
/// top of a [`Transport`].
///
/// Every operation normalizes its arguments into a canonical [`Statement`],
/// then runs the registered stages in order: compile, execute, unpack, plus
/// whatever the caller appended through [`register`](Self::register). The
/// stage list is fixed after construction time setup; per-call state lives in
/// a fresh [`QueryContext`], so a `Db` value can serve concurrent calls.
pub struct Db<T: Transport> {
    transport: T,
    writer: MySqlWriter,
    stages: Vec<(StageFilter, Box<dyn Stage<T>>)>,
}

impl<T: Transport + 'static> Db<T> {
    pub fn new(transport: T) -> Self {
        let mut db = Self {
            transport,
            writer: MySqlWriter::new(),
            stages: Vec::new(),
        };
        db.register(StageFilter::All, compile_stage::<T>);
        db.register(StageFilter::All, execute_stage::<T>);
        db.register(StageFilter::All, unpack_stage::<T>);
        db
    }

    /// Append a stage to the pipeline. Registration happens before first
    /// use; appended stages run after the built-in unpack stage, only for
    /// statements their filter matches.
    pub fn register(&mut self, filter: StageFilter, stage: impl Stage<T> + 'static) -> &mut Self {
        self.stages.push((filter, Box::new(stage)));
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn writer(&self) -> &MySqlWriter {
        &self.writer
    }

    /// Run one descriptor through the pipeline with the default unpacking.
    pub async fn query(&self, statement: Statement) -> Result<QueryOutput> {
        self.query_unpacked(statement, Unpack::Rows).await
    }

    /// Run one descriptor through the pipeline. One invocation is one pass:
    /// no retries, and the first failing stage aborts the rest.
    pub async fn query_unpacked(
        &self,
        statement: Statement,
        unpack: Unpack,
    ) -> Result<QueryOutput> {
        let mut cx = QueryContext::new(statement, unpack);
        for (filter, stage) in &self.stages {
            if filter.matches(cx.kind()) {
                match stage.run(&mut cx, self).await? {
                    Flow::Continue => {}
                    Flow::Done => break,
                }
            }
        }
        Ok(cx.into_output())
    }

    /// Raw SQL with positional binds (`??` identifier, `?` literal).
    pub async fn query_raw(&self, sql: impl Into<String>, binds: Vec<Value>) -> Result<QueryOutput> {
        self.query(Statement::Raw {
            sql: sql.into(),
            binds,
        })
        .await
    }

    /// Raw-row streaming mode: compile the binds, then hand rows through
    /// lazily from the transport, bypassing the stage pipeline entirely.
    pub fn fetch(
        &self,
        sql: impl Into<String>,
        binds: Vec<Value>,
    ) -> impl Stream<Item = Result<RowLabeled>> + Send + '_ {
        let sql = sql.into();
        try_stream! {
            let mut text = String::with_capacity(sql.len() + 32);
            self.writer.write_raw(&mut text, &sql, &binds)?;
            log::debug!("Streaming: {}", crate::truncate_long!(text));
            let rows = self.transport.fetch(&text);
            for await row in rows {
                yield row?;
            }
        }
    }

    /// Create a table: the given columns, or a minimal auto-increment key
    /// column when none are given. A `None` name is replaced with a freshly
    /// generated one; the resolved name is always handed back.
    pub async fn create_table(
        &self,
        table: Option<&str>,
        columns: &[ColumnDef],
    ) -> Result<String> {
        let table = table.map_or_else(|| unique_name("table"), str::to_owned);
        self.query(Statement::CreateTable {
            table: table.clone(),
            columns: columns.to_vec(),
            like: None,
        })
        .await?;
        Ok(table)
    }

    /// Create a table cloning another table's structure.
    pub async fn create_table_like(&self, table: Option<&str>, like: &str) -> Result<String> {
        let table = table.map_or_else(|| unique_name("table"), str::to_owned);
        self.query(Statement::CreateTable {
            table: table.clone(),
            columns: Vec::new(),
            like: Some(like.to_owned()),
        })
        .await?;
        Ok(table)
    }

    pub async fn drop_table(&self, table: &str) -> Result<RowsAffected> {
        Ok(self
            .query(Statement::DropTable {
                table: table.to_owned(),
            })
            .await?
            .affected)
    }

    pub async fn truncate_table(&self, table: &str) -> Result<RowsAffected> {
        Ok(self
            .query(Statement::TruncateTable {
                table: table.to_owned(),
            })
            .await?
            .affected)
    }

    /// Rename a table; a `None` destination derives `<from><unique suffix>`.
    /// Returns the resolved destination name.
    pub async fn rename_table(&self, from: &str, to: Option<&str>) -> Result<String> {
        let to = to.map_or_else(|| unique_name(from), str::to_owned);
        self.query(Statement::RenameTable {
            table: from.to_owned(),
            to: to.clone(),
        })
        .await?;
        Ok(to)
    }

    /// Copy a table's structure and content. Returns the resolved
    /// destination name.
    pub async fn copy_table(&self, from: &str, to: Option<&str>) -> Result<String> {
        let to = to.map_or_else(|| unique_name(from), str::to_owned);
        self.create_table_like(Some(&to), from).await?;
        self.query(Statement::Insert {
            table: to.clone(),
            rows: Vec::new(),
            update: None,
            select: Some(SelectSource {
                table: from.to_owned(),
                filter: None,
            }),
        })
        .await?;
        Ok(to)
    }

    /// Probe a table with `SELECT ... LIMIT 1`. Any failure, including a
    /// connectivity loss, reads as "does not exist"; the swallowed error is
    /// logged so genuine outages stay diagnosable.
    pub async fn table_exists(&self, table: &str) -> bool {
        match self.query(Select::from(table).limit(1).into()).await {
            Ok(_) => true,
            Err(e) => {
                log::warn!("Treating failed probe of `{}` as absence: {:#}", table, e);
                false
            }
        }
    }

    /// Insert one record; an empty record inserts `{id: NULL}`, producing a
    /// fresh auto-increment row.
    pub async fn insert(&self, table: &str, record: Record) -> Result<RowsAffected> {
        self.insert_many(table, vec![record]).await
    }

    /// Multi-row insert; one statement, not one per record.
    pub async fn insert_many(&self, table: &str, mut records: Vec<Record>) -> Result<RowsAffected> {
        if records.is_empty() {
            records.push(Record::new());
        }
        for record in &mut records {
            if record.is_empty() {
                record.push(KEY_FIELD, Value::Null);
            }
        }
        Ok(self
            .query(Statement::Insert {
                table: table.to_owned(),
                rows: records,
                update: None,
                select: None,
            })
            .await?
            .affected)
    }

    pub async fn update(
        &self,
        table: &str,
        filter: impl Into<Filter>,
        set: Record,
    ) -> Result<RowsAffected> {
        Ok(self
            .query(Statement::Update {
                table: table.to_owned(),
                set,
                filter: filter.into(),
            })
            .await?
            .affected)
    }

    pub async fn delete(&self, table: &str, filter: impl Into<Filter>) -> Result<RowsAffected> {
        Ok(self
            .query(Statement::Delete {
                table: table.to_owned(),
                filter: filter.into(),
            })
            .await?
            .affected)
    }

    /// Upsert: insert, or update the listed fields (all fields when `None`)
    /// on a key conflict. An empty record behaves like [`insert`](Self::insert).
    pub async fn save(
        &self,
        table: &str,
        mut record: Record,
        update_fields: Option<&[&str]>,
    ) -> Result<RowsAffected> {
        if record.is_empty() {
            record.push(KEY_FIELD, Value::Null);
        }
        let update = match update_fields {
            Some(fields) => record.pick(fields),
            None => record.clone(),
        };
        Ok(self
            .query(Statement::Insert {
                table: table.to_owned(),
                rows: vec![record],
                update: Some(update),
                select: None,
            })
            .await?
            .affected)
    }

    /// Clone one row into a fresh row of the same table, applying
    /// `overrides` on the way and letting the key auto-increment.
    ///
    /// Multi-step recipe: a scratch table cloned from the source receives the
    /// row by key, gets the overrides applied and its key column dropped,
    /// then its content is inserted back. The scratch table is dropped on
    /// every exit path.
    pub async fn duplicate(
        &self,
        table: &str,
        key: impl Into<Value>,
        overrides: Record,
    ) -> Result<RowsAffected> {
        let scratch = unique_name(table);
        self.create_table_like(Some(&scratch), table).await?;
        let copied = self
            .duplicate_into(table, &scratch, key.into(), overrides)
            .await;
        if let Err(e) = self.drop_table(&scratch).await {
            log::warn!("Failed to drop scratch table `{}`: {:#}", scratch, e);
        }
        copied
    }

    async fn duplicate_into(
        &self,
        table: &str,
        scratch: &str,
        key: Value,
        overrides: Record,
    ) -> Result<RowsAffected> {
        self.query(Statement::Insert {
            table: scratch.to_owned(),
            rows: Vec::new(),
            update: None,
            select: Some(SelectSource {
                table: table.to_owned(),
                filter: Some(Filter::Key(key.clone())),
            }),
        })
        .await?;
        if !overrides.is_empty() {
            self.update(scratch, Filter::Key(key), overrides).await?;
        }
        self.query(Statement::AlterTableDrop {
            table: scratch.to_owned(),
            column: KEY_FIELD.to_owned(),
        })
        .await?;
        let output = self
            .query_raw(
                "INSERT INTO ?? SELECT NULL, ??.* FROM ??",
                vec![table.into(), scratch.into(), scratch.into()],
            )
            .await?;
        Ok(output.affected)
    }

    /// Run a full SELECT descriptor and hand back the row sequence.
    pub async fn select(&self, query: Select) -> Result<Vec<RowLabeled>> {
        self.query(query.into()).await?.payload.into_rows()
    }

    pub async fn select_all(&self, table: &str) -> Result<Vec<RowLabeled>> {
        self.select(Select::from(table)).await
    }

    /// Single-row lookup by key.
    pub async fn select_one(
        &self,
        table: &str,
        key: impl Into<Value>,
    ) -> Result<Option<RowLabeled>> {
        let statement = Select::from(table).filter(Filter::Key(key.into())).into();
        self.query_unpacked(statement, Unpack::Row)
            .await?
            .payload
            .into_row()
    }

    /// Single-column lookup: the named field's value sequence.
    pub async fn select_column(
        &self,
        table: &str,
        filter: Option<Filter>,
        column: &str,
    ) -> Result<Vec<Value>> {
        let statement = Statement::Select {
            table: table.to_owned(),
            filter,
            projection: crate::Projection::Column(column.to_owned()),
            order_by: Vec::new(),
            limit: None,
        };
        self.query_unpacked(statement, Unpack::Column(column.to_owned()))
            .await?
            .payload
            .into_column()
    }

    /// Single-row, single-column lookup by key.
    pub async fn select_cell(
        &self,
        table: &str,
        key: impl Into<Value>,
        column: &str,
    ) -> Result<Option<Value>> {
        let statement = Statement::Select {
            table: table.to_owned(),
            filter: Some(Filter::Key(key.into())),
            projection: crate::Projection::Column(column.to_owned()),
            order_by: Vec::new(),
            limit: None,
        };
        self.query_unpacked(statement, Unpack::Cell(column.to_owned()))
            .await?
            .payload
            .into_cell()
    }

    /// Aggregate query builder. The last field is the aggregation target,
    /// everything before it a grouping column in caller order; no fields
    /// targets the key (`*` for count). Without grouping the result is a
    /// single scalar, with grouping the untouched row sequence.
    pub async fn aggregate(
        &self,
        func: AggregateFunc,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        let mut fields = fields.iter();
        let target = fields
            .next_back()
            .map(|v| (*v).to_owned())
            .unwrap_or_else(|| match func {
                AggregateFunc::Count => "*".to_owned(),
                _ => KEY_FIELD.to_owned(),
            });
        let group: Vec<String> = fields.map(|v| (*v).to_owned()).collect();
        let grouped = !group.is_empty();
        let statement = Statement::Aggregate {
            func,
            table: table.to_owned(),
            filter,
            group,
            target,
        };
        if grouped {
            Ok(Aggregate::Groups(
                self.query(statement).await?.payload.into_rows()?,
            ))
        } else {
            let unpack = Unpack::Scalar {
                keep_type: func.keeps_native_type(),
            };
            Ok(Aggregate::Scalar(
                self.query_unpacked(statement, unpack)
                    .await?
                    .payload
                    .into_scalar()?,
            ))
        }
    }

    pub async fn count(
        &self,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        self.aggregate(AggregateFunc::Count, table, filter, fields)
            .await
    }

    pub async fn min(
        &self,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        self.aggregate(AggregateFunc::Min, table, filter, fields)
            .await
    }

    pub async fn max(
        &self,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        self.aggregate(AggregateFunc::Max, table, filter, fields)
            .await
    }

    pub async fn avg(
        &self,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        self.aggregate(AggregateFunc::Avg, table, filter, fields)
            .await
    }

    pub async fn sum(
        &self,
        table: &str,
        filter: Option<Filter>,
        fields: &[&str],
    ) -> Result<Aggregate> {
        self.aggregate(AggregateFunc::Sum, table, filter, fields)
            .await
    }
}

/// Result of an aggregate query: a scalar when no grouping fields were
/// given, one row per group otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Scalar(Value),
    Groups(Vec<RowLabeled>),
}

impl Aggregate {
    pub fn scalar(self) -> Result<Value> {
        match self {
            Aggregate::Scalar(value) => Ok(value),
            Aggregate::Groups(..) => Err(Error::msg("expected a scalar aggregate, got groups")),
        }
    }
    pub fn groups(self) -> Result<Vec<RowLabeled>> {
        match self {
            Aggregate::Groups(rows) => Ok(rows),
            Aggregate::Scalar(..) => Err(Error::msg("expected grouped aggregate rows, got a scalar")),
        }
    }
}

fn compile_stage<'a, T: Transport + 'static>(
    cx: &'a mut QueryContext,
    db: &'a Db<T>,
) -> BoxFuture<'a, Result<Flow>> {
    Box::pin(async move {
        let mut sql = String::with_capacity(128);
        db.writer().write_statement(&mut sql, &cx.statement)?;
        log::debug!("Compiled: {}", crate::truncate_long!(sql));
        cx.sql = sql;
        Ok(Flow::Continue)
    })
}

fn execute_stage<'a, T: Transport + 'static>(
    cx: &'a mut QueryContext,
    db: &'a Db<T>,
) -> BoxFuture<'a, Result<Flow>> {
    Box::pin(async move {
        let reply = db.transport().execute(&cx.sql).await?;
        cx.rows = reply.rows;
        cx.affected = reply.affected;
        Ok(Flow::Continue)
    })
}

fn unpack_stage<'a, T: Transport + 'static>(
    cx: &'a mut QueryContext,
    _db: &'a Db<T>,
) -> BoxFuture<'a, Result<Flow>> {
    Box::pin(async move {
        let rows = std::mem::take(&mut cx.rows);
        cx.payload = Some(cx.unpack.apply(rows));
        Ok(Flow::Continue)
    })
}
