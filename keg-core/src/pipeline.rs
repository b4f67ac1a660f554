use crate::{
    Db, Payload, Result, RowLabeled, RowsAffected, Statement, StatementKind, Transport, Unpack,
};
use futures::future::BoxFuture;

/// What a stage tells the executor to do next. Errors short-circuit instead:
/// a stage returning `Err` aborts the remaining stages and surfaces the error
/// to the caller untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// Finish the run now with the context as it stands; later stages do not
    /// run and no error is reported.
    Done,
}

/// Decides which statements a registered stage sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    All,
    Kind(StatementKind),
}

impl StageFilter {
    pub fn matches(&self, kind: StatementKind) -> bool {
        match self {
            StageFilter::All => true,
            StageFilter::Kind(k) => *k == kind,
        }
    }
}

/// One step of the execution pipeline.
///
/// The built-in stages (compile, execute, unpack) are plain functions; custom
/// stages registered through [`Db::register`](crate::Db::register) usually
/// carry state and implement the trait on a struct. Plain functions of the
/// right shape get the blanket impl.
pub trait Stage<T: Transport>: Send + Sync {
    fn run<'a>(&'a self, cx: &'a mut QueryContext, db: &'a Db<T>) -> BoxFuture<'a, Result<Flow>>;
}

impl<T, F> Stage<T> for F
where
    T: Transport,
    F: for<'a> Fn(&'a mut QueryContext, &'a Db<T>) -> BoxFuture<'a, Result<Flow>> + Send + Sync,
{
    fn run<'a>(&'a self, cx: &'a mut QueryContext, db: &'a Db<T>) -> BoxFuture<'a, Result<Flow>> {
        self(cx, db)
    }
}

/// Per-invocation mutable state threaded through the stages. Owned by a
/// single pipeline run and discarded afterwards, so concurrent runs never
/// share anything beyond the immutable stage list.
#[derive(Debug)]
pub struct QueryContext {
    /// The descriptor being executed.
    pub statement: Statement,
    /// Reshaping hint attached by the operation builder.
    pub unpack: Unpack,
    /// Compiled SQL text, empty until the compile stage ran.
    pub sql: String,
    /// Raw rows from the transport, drained by the unpack stage.
    pub rows: Vec<RowLabeled>,
    pub affected: RowsAffected,
    /// Reshaped result, present once the unpack stage ran.
    pub payload: Option<Payload>,
}

impl QueryContext {
    pub(crate) fn new(statement: Statement, unpack: Unpack) -> Self {
        Self {
            statement,
            unpack,
            sql: String::new(),
            rows: Vec::new(),
            affected: RowsAffected::default(),
            payload: None,
        }
    }

    pub fn kind(&self) -> StatementKind {
        self.statement.kind()
    }

    pub(crate) fn into_output(self) -> QueryOutput {
        QueryOutput {
            sql: self.sql,
            affected: self.affected,
            payload: self.payload.unwrap_or(Payload::Rows(self.rows)),
        }
    }
}

/// Final state of one pipeline run.
#[derive(Debug)]
pub struct QueryOutput {
    /// The SQL text that was executed.
    pub sql: String,
    pub affected: RowsAffected,
    pub payload: Payload,
}
