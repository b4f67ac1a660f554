use crate::{Filter, Record, Value};

/// Operation tag used by stage filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CreateTable,
    DropTable,
    TruncateTable,
    RenameTable,
    AlterTable,
    Insert,
    Update,
    Delete,
    Select,
    Aggregate,
    Raw,
}

/// A query descriptor: the structured description of one data operation,
/// compiled to SQL text by the [`SqlWriter`](crate::SqlWriter) before
/// execution.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
        like: Option<String>,
    },
    DropTable {
        table: String,
    },
    TruncateTable {
        table: String,
    },
    RenameTable {
        table: String,
        to: String,
    },
    /// Drops a single column, the only table alteration this layer performs
    /// (part of the row duplication recipe).
    AlterTableDrop {
        table: String,
        column: String,
    },
    Insert {
        table: String,
        rows: Vec<Record>,
        /// Upsert payload: emits `ON DUPLICATE KEY UPDATE` when present.
        update: Option<Record>,
        /// INSERT...SELECT source, used by table copy and row duplication.
        select: Option<SelectSource>,
    },
    Update {
        table: String,
        set: Record,
        filter: Filter,
    },
    Delete {
        table: String,
        filter: Filter,
    },
    Select {
        table: String,
        filter: Option<Filter>,
        projection: Projection,
        order_by: Vec<Ordered>,
        limit: Option<u64>,
    },
    Aggregate {
        func: AggregateFunc,
        table: String,
        filter: Option<Filter>,
        group: Vec<String>,
        target: String,
    },
    /// Raw SQL with positional binds: `??` consumes a bind as an escaped
    /// identifier, `?` as an escaped literal.
    Raw {
        sql: String,
        binds: Vec<Value>,
    },
}

impl Statement {
    pub fn kind(&self) -> StatementKind {
        match self {
            Statement::CreateTable { .. } => StatementKind::CreateTable,
            Statement::DropTable { .. } => StatementKind::DropTable,
            Statement::TruncateTable { .. } => StatementKind::TruncateTable,
            Statement::RenameTable { .. } => StatementKind::RenameTable,
            Statement::AlterTableDrop { .. } => StatementKind::AlterTable,
            Statement::Insert { .. } => StatementKind::Insert,
            Statement::Update { .. } => StatementKind::Update,
            Statement::Delete { .. } => StatementKind::Delete,
            Statement::Select { .. } => StatementKind::Select,
            Statement::Aggregate { .. } => StatementKind::Aggregate,
            Statement::Raw { .. } => StatementKind::Raw,
        }
    }
}

/// Sub-descriptor of the INSERT...SELECT form.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectSource {
    pub table: String,
    pub filter: Option<Filter>,
}

/// Field projection of a SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Projection {
    /// All fields (`*`).
    #[default]
    All,
    Columns(Vec<String>),
    /// A single scalar field name: the shape that triggers column flattening
    /// on unpack.
    Column(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Order {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY entry; the column goes through identifier escaping, keeping
/// the clause safe from text injection.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    pub column: String,
    pub order: Order,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunc {
    Count,
    Min,
    Max,
    Avg,
    Sum,
}

impl AggregateFunc {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Avg => "AVG",
            AggregateFunc::Sum => "SUM",
        }
    }
    /// Result column alias, also the lowercase method name.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::Count => "count",
            AggregateFunc::Min => "min",
            AggregateFunc::Max => "max",
            AggregateFunc::Avg => "avg",
            AggregateFunc::Sum => "sum",
        }
    }
    /// min/max keep the column's native type so text and dates remain
    /// comparable; the other functions coerce to a numeric value.
    pub fn keeps_native_type(&self) -> bool {
        matches!(self, AggregateFunc::Min | AggregateFunc::Max)
    }
}

/// Column description of CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    /// Type prototype: the variant decides the SQL column type.
    pub ty: Value,
    pub primary_key: bool,
    pub auto_increment: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, ty: Value) -> Self {
        Self {
            name: name.into(),
            ty,
            primary_key: false,
            auto_increment: false,
        }
    }
    /// The auto-increment `id` key column created when no columns are given.
    pub fn key() -> Self {
        Self {
            name: crate::KEY_FIELD.into(),
            ty: Value::Int64(None),
            primary_key: true,
            auto_increment: true,
        }
    }
}

impl From<&str> for ColumnDef {
    /// Shorthand column list: `"id"` becomes the auto-increment key column,
    /// any other name a TEXT column.
    fn from(name: &str) -> Self {
        if name == crate::KEY_FIELD {
            ColumnDef::key()
        } else {
            ColumnDef::new(name, Value::Varchar(None))
        }
    }
}

/// SELECT descriptor builder; converts into [`Statement::Select`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub table: String,
    pub filter: Option<Filter>,
    pub projection: Projection,
    pub order_by: Vec<Ordered>,
    pub limit: Option<u64>,
}

impl Select {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }
    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = Some(filter.into());
        self
    }
    pub fn columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.projection = Projection::Columns(columns.into_iter().map(Into::into).collect());
        self
    }
    /// Single-column projection, flattened to a value sequence on unpack.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.projection = Projection::Column(column.into());
        self
    }
    pub fn order_by(mut self, column: impl Into<String>, order: Order) -> Self {
        self.order_by.push(Ordered {
            column: column.into(),
            order,
        });
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl From<Select> for Statement {
    fn from(select: Select) -> Self {
        Statement::Select {
            table: select.table,
            filter: select.filter,
            projection: select.projection,
            order_by: select.order_by,
            limit: select.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_builder_roundtrip() {
        let statement: Statement = Select::from("person")
            .filter(Filter::field("gender", "male"))
            .columns(["id", "name"])
            .order_by("id", Order::Desc)
            .limit(10)
            .into();
        assert_eq!(statement.kind(), StatementKind::Select);
        let Statement::Select {
            table,
            projection,
            order_by,
            limit,
            ..
        } = statement
        else {
            panic!("expected a select");
        };
        assert_eq!(table, "person");
        assert_eq!(
            projection,
            Projection::Columns(vec!["id".into(), "name".into()])
        );
        assert_eq!(order_by[0].order, Order::Desc);
        assert_eq!(limit, Some(10));
    }

    #[test]
    fn column_shorthand() {
        let id: ColumnDef = "id".into();
        assert!(id.primary_key && id.auto_increment);
        let name: ColumnDef = "name".into();
        assert_eq!(name.ty, Value::Varchar(None));
        assert!(!name.primary_key);
    }
}
