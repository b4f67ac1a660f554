use crate::{
    AggregateFunc, ColumnDef, Error, Filter, KEY_FIELD, Ordered, Projection, Record, Result,
    SelectSource, Statement, Value, separated_by,
};
use std::fmt::Write;
use time::{Date, PrimitiveDateTime, Time};

macro_rules! write_integer {
    ($out:ident, $value:expr) => {{
        let mut buffer = itoa::Buffer::new();
        $out.push_str(buffer.format($value));
    }};
}
macro_rules! write_float {
    ($out:ident, $value:expr) => {{
        if $value.is_finite() {
            let mut buffer = ryu::Buffer::new();
            $out.push_str(buffer.format($value));
        } else {
            log::warn!("Non finite float {} written as NULL", $value);
            $out.push_str("NULL");
        }
    }};
}

/// Descriptor compiler: turns a [`Statement`] into final SQL text with every
/// identifier and value escaped. The default methods implement the MySQL
/// dialect, the only one this layer targets; a custom writer can still
/// override individual fragments.
pub trait SqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + 1;
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers (`name`) doubling inner backticks.
    fn write_identifier(&self, out: &mut String, value: &str) {
        out.push('`');
        self.write_escaped(out, value, '`', "``");
        out.push('`');
    }

    /// Render a concrete value (including proper quoting / escaping).
    fn write_value(&self, out: &mut String, value: &Value) {
        match value {
            v if v.is_null() => out.push_str("NULL"),
            Value::Boolean(Some(v)) => out.push_str(["false", "true"][*v as usize]),
            Value::Int8(Some(v)) => write_integer!(out, *v),
            Value::Int16(Some(v)) => write_integer!(out, *v),
            Value::Int32(Some(v)) => write_integer!(out, *v),
            Value::Int64(Some(v)) => write_integer!(out, *v),
            Value::UInt8(Some(v)) => write_integer!(out, *v),
            Value::UInt16(Some(v)) => write_integer!(out, *v),
            Value::UInt32(Some(v)) => write_integer!(out, *v),
            Value::UInt64(Some(v)) => write_integer!(out, *v),
            Value::Float32(Some(v)) => write_float!(out, *v),
            Value::Float64(Some(v)) => write_float!(out, *v),
            Value::Decimal(Some(v), ..) => drop(write!(out, "{}", v)),
            Value::Varchar(Some(v)) => self.write_value_string(out, v),
            Value::Blob(Some(v)) => self.write_value_blob(out, v),
            Value::Date(Some(v)) => {
                out.push('\'');
                self.write_value_date(out, v);
                out.push('\'');
            }
            Value::Time(Some(v)) => {
                out.push('\'');
                self.write_value_time(out, v);
                out.push('\'');
            }
            Value::Timestamp(Some(v)) => self.write_value_timestamp(out, v),
            Value::Uuid(Some(v)) => drop(write!(out, "'{}'", v)),
            _ => {
                log::error!("Cannot write {:?}", value);
            }
        };
    }

    /// Render and escape a string literal using single quotes.
    fn write_value_string(&self, out: &mut String, value: &str) {
        out.push('\'');
        for c in value.chars() {
            match c {
                '\'' => out.push_str("''"),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\0' => out.push_str("\\0"),
                '\u{1a}' => out.push_str("\\Z"),
                c => out.push(c),
            }
        }
        out.push('\'');
    }

    /// Render a blob literal as a hex string.
    fn write_value_blob(&self, out: &mut String, value: &[u8]) {
        out.push_str("X'");
        out.push_str(&hex::encode_upper(value));
        out.push('\'');
    }

    fn write_value_date(&self, out: &mut String, value: &Date) {
        let _ = write!(
            out,
            "{:04}-{:02}-{:02}",
            value.year(),
            u8::from(value.month()),
            value.day()
        );
    }

    fn write_value_time(&self, out: &mut String, value: &Time) {
        let _ = write!(
            out,
            "{:02}:{:02}:{:02}",
            value.hour(),
            value.minute(),
            value.second()
        );
        if value.microsecond() > 0 {
            let _ = write!(out, ".{:06}", value.microsecond());
        }
    }

    fn write_value_timestamp(&self, out: &mut String, value: &PrimitiveDateTime) {
        out.push('\'');
        self.write_value_date(out, &value.date());
        out.push(' ');
        self.write_value_time(out, &value.time());
        out.push('\'');
    }

    /// Render the SQL type for a `Value` prototype.
    fn write_column_type(&self, out: &mut String, value: &Value) {
        match value {
            Value::Boolean(..) => out.push_str("BOOLEAN"),
            Value::Int8(..) => out.push_str("TINYINT"),
            Value::Int16(..) => out.push_str("SMALLINT"),
            Value::Int32(..) => out.push_str("INTEGER"),
            Value::Int64(..) => out.push_str("BIGINT"),
            Value::UInt8(..) => out.push_str("TINYINT UNSIGNED"),
            Value::UInt16(..) => out.push_str("SMALLINT UNSIGNED"),
            Value::UInt32(..) => out.push_str("INTEGER UNSIGNED"),
            Value::UInt64(..) => out.push_str("BIGINT UNSIGNED"),
            Value::Float32(..) => out.push_str("FLOAT"),
            Value::Float64(..) => out.push_str("DOUBLE"),
            Value::Decimal(.., precision, scale) => {
                out.push_str("DECIMAL");
                if (precision, scale) != (&0, &0) {
                    let _ = write!(out, "({},{})", precision, scale);
                }
            }
            Value::Varchar(..) => out.push_str("TEXT"),
            Value::Blob(..) => out.push_str("BLOB"),
            Value::Date(..) => out.push_str("DATE"),
            Value::Time(..) => out.push_str("TIME"),
            Value::Timestamp(..) => out.push_str("DATETIME"),
            Value::Uuid(..) => out.push_str("CHAR(36)"),
            Value::Null => {
                log::error!("Null has no column type, falling back to TEXT");
                out.push_str("TEXT");
            }
        };
    }

    /// Render `\nWHERE ...` unless the filter is the explicit match-all.
    ///
    /// An empty normalized predicate is a compile error: silently matching
    /// every row is exactly the accident this check prevents.
    fn write_where(&self, out: &mut String, filter: &Filter) -> Result<()> {
        if matches!(filter, Filter::All) {
            return Ok(());
        }
        if filter.is_empty() {
            return Err(Error::msg(
                "empty predicate would match every row, use Filter::All for an unconditional statement",
            ));
        }
        out.push_str("\nWHERE ");
        self.write_filter(out, filter);
        Ok(())
    }

    /// Render the predicate itself, without the WHERE keyword.
    fn write_filter(&self, out: &mut String, filter: &Filter) {
        match filter {
            Filter::All => out.push_str("true"),
            Filter::Key(value) => {
                self.write_identifier(out, KEY_FIELD);
                out.push_str(" = ");
                self.write_value(out, value);
            }
            Filter::Keys(values) => {
                self.write_identifier(out, KEY_FIELD);
                out.push_str(" IN (");
                separated_by(out, values, |out, v| self.write_value(out, v), ", ");
                out.push(')');
            }
            Filter::Fields(fields) => {
                separated_by(
                    out,
                    fields,
                    |out, (name, value)| {
                        self.write_identifier(out, name);
                        if value.is_null() {
                            out.push_str(" IS NULL");
                        } else {
                            out.push_str(" = ");
                            self.write_value(out, value);
                        }
                    },
                    " AND ",
                );
            }
        }
    }

    /// Compile a whole descriptor into SQL text.
    fn write_statement(&self, out: &mut String, statement: &Statement) -> Result<()> {
        match statement {
            Statement::CreateTable {
                table,
                columns,
                like,
            } => self.write_create_table(out, table, columns, like.as_deref()),
            Statement::DropTable { table } => self.write_drop_table(out, table),
            Statement::TruncateTable { table } => self.write_truncate_table(out, table),
            Statement::RenameTable { table, to } => self.write_rename_table(out, table, to),
            Statement::AlterTableDrop { table, column } => {
                self.write_alter_table_drop(out, table, column)
            }
            Statement::Insert {
                table,
                rows,
                update,
                select,
            } => {
                return self.write_insert(out, table, rows, update.as_ref(), select.as_ref());
            }
            Statement::Update { table, set, filter } => {
                return self.write_update(out, table, set, filter);
            }
            Statement::Delete { table, filter } => return self.write_delete(out, table, filter),
            Statement::Select {
                table,
                filter,
                projection,
                order_by,
                limit,
            } => {
                return self.write_select(
                    out,
                    table,
                    filter.as_ref(),
                    projection,
                    order_by,
                    *limit,
                );
            }
            Statement::Aggregate {
                func,
                table,
                filter,
                group,
                target,
            } => return self.write_aggregate(out, *func, table, filter.as_ref(), group, target),
            Statement::Raw { sql, binds } => return self.write_raw(out, sql, binds),
        }
        Ok(())
    }

    /// Emit CREATE TABLE: the minimal key-only table, caller columns, or a
    /// LIKE clone of another table's structure.
    fn write_create_table(
        &self,
        out: &mut String,
        table: &str,
        columns: &[ColumnDef],
        like: Option<&str>,
    ) {
        out.push_str("CREATE TABLE ");
        self.write_identifier(out, table);
        if let Some(like) = like {
            out.push_str(" LIKE ");
            self.write_identifier(out, like);
            out.push(';');
            return;
        }
        let key = [ColumnDef::key()];
        let columns = if columns.is_empty() { &key } else { columns };
        out.push_str(" (\n");
        separated_by(
            out,
            columns,
            |out, column| {
                self.write_identifier(out, &column.name);
                out.push(' ');
                self.write_column_type(out, &column.ty);
                if column.primary_key || column.auto_increment {
                    out.push_str(" NOT NULL");
                }
                if column.auto_increment {
                    out.push_str(" AUTO_INCREMENT");
                }
                if column.primary_key {
                    out.push_str(" PRIMARY KEY");
                }
            },
            ",\n",
        );
        out.push_str("\n);");
    }

    fn write_drop_table(&self, out: &mut String, table: &str) {
        out.push_str("DROP TABLE ");
        self.write_identifier(out, table);
        out.push(';');
    }

    fn write_truncate_table(&self, out: &mut String, table: &str) {
        out.push_str("TRUNCATE TABLE ");
        self.write_identifier(out, table);
        out.push(';');
    }

    fn write_rename_table(&self, out: &mut String, table: &str, to: &str) {
        out.push_str("RENAME TABLE ");
        self.write_identifier(out, table);
        out.push_str(" TO ");
        self.write_identifier(out, to);
        out.push(';');
    }

    fn write_alter_table_drop(&self, out: &mut String, table: &str, column: &str) {
        out.push_str("ALTER TABLE ");
        self.write_identifier(out, table);
        out.push_str(" DROP COLUMN ");
        self.write_identifier(out, column);
        out.push(';');
    }

    /// Emit INSERT: multi-row VALUES, INSERT...SELECT, optionally with the
    /// ON DUPLICATE KEY UPDATE upsert fragment.
    ///
    /// The first record fixes the column list; later records fill missing
    /// fields with DEFAULT.
    fn write_insert(
        &self,
        out: &mut String,
        table: &str,
        rows: &[Record],
        update: Option<&Record>,
        select: Option<&SelectSource>,
    ) -> Result<()> {
        out.push_str("INSERT INTO ");
        self.write_identifier(out, table);
        if let Some(source) = select {
            out.push_str("\nSELECT *\nFROM ");
            self.write_identifier(out, &source.table);
            if let Some(filter) = &source.filter {
                self.write_where(out, filter)?;
            }
            out.push(';');
            return Ok(());
        }
        let Some(first) = rows.first() else {
            return Err(Error::msg("insert requires at least one record"));
        };
        out.push_str(" (");
        separated_by(
            out,
            first.fields(),
            |out, name| self.write_identifier(out, name),
            ", ",
        );
        out.push_str(") VALUES\n");
        separated_by(
            out,
            rows,
            |out, row| {
                out.push('(');
                separated_by(
                    out,
                    first.fields(),
                    |out, name| match row.get(name) {
                        Some(value) => self.write_value(out, value),
                        None => out.push_str("DEFAULT"),
                    },
                    ", ",
                );
                out.push(')');
            },
            ",\n",
        );
        if let Some(update) = update {
            out.push_str("\nON DUPLICATE KEY UPDATE\n");
            separated_by(
                out,
                update.iter(),
                |out, (name, value)| {
                    self.write_identifier(out, name);
                    out.push_str(" = ");
                    self.write_value(out, value);
                },
                ",\n",
            );
        }
        out.push(';');
        Ok(())
    }

    fn write_update(&self, out: &mut String, table: &str, set: &Record, filter: &Filter) -> Result<()> {
        if set.is_empty() {
            return Err(Error::msg("update requires a non-empty payload"));
        }
        out.push_str("UPDATE ");
        self.write_identifier(out, table);
        out.push_str("\nSET ");
        separated_by(
            out,
            set.iter(),
            |out, (name, value)| {
                self.write_identifier(out, name);
                out.push_str(" = ");
                self.write_value(out, value);
            },
            ", ",
        );
        self.write_where(out, filter)?;
        out.push(';');
        Ok(())
    }

    fn write_delete(&self, out: &mut String, table: &str, filter: &Filter) -> Result<()> {
        out.push_str("DELETE FROM ");
        self.write_identifier(out, table);
        self.write_where(out, filter)?;
        out.push(';');
        Ok(())
    }

    /// Emit SELECT (projection, FROM, WHERE, ORDER BY, LIMIT).
    fn write_select(
        &self,
        out: &mut String,
        table: &str,
        filter: Option<&Filter>,
        projection: &Projection,
        order_by: &[Ordered],
        limit: Option<u64>,
    ) -> Result<()> {
        out.push_str("SELECT ");
        match projection {
            Projection::All => out.push('*'),
            Projection::Columns(columns) => separated_by(
                out,
                columns,
                |out, column| self.write_identifier(out, column),
                ", ",
            ),
            Projection::Column(column) => self.write_identifier(out, column),
        }
        out.push_str("\nFROM ");
        self.write_identifier(out, table);
        if let Some(filter) = filter {
            self.write_where(out, filter)?;
        }
        if !order_by.is_empty() {
            out.push_str("\nORDER BY ");
            separated_by(
                out,
                order_by,
                |out, ordered| {
                    self.write_identifier(out, &ordered.column);
                    if ordered.order == crate::Order::Desc {
                        out.push_str(" DESC");
                    }
                },
                ", ",
            );
        }
        if let Some(limit) = limit {
            let _ = write!(out, "\nLIMIT {}", limit);
        }
        out.push(';');
        Ok(())
    }

    /// Emit the aggregate query: grouping columns first, then the aggregate
    /// call aliased to the function's lowercase name.
    fn write_aggregate(
        &self,
        out: &mut String,
        func: AggregateFunc,
        table: &str,
        filter: Option<&Filter>,
        group: &[String],
        target: &str,
    ) -> Result<()> {
        out.push_str("SELECT ");
        separated_by(
            out,
            group,
            |out, column| self.write_identifier(out, column),
            ", ",
        );
        if !group.is_empty() {
            out.push_str(", ");
        }
        out.push_str(func.as_sql());
        out.push('(');
        if target == "*" {
            out.push('*');
        } else {
            self.write_identifier(out, target);
        }
        out.push_str(") AS ");
        self.write_identifier(out, func.name());
        out.push_str("\nFROM ");
        self.write_identifier(out, table);
        if let Some(filter) = filter {
            self.write_where(out, filter)?;
        }
        if !group.is_empty() {
            out.push_str("\nGROUP BY ");
            separated_by(
                out,
                group,
                |out, column| self.write_identifier(out, column),
                ", ",
            );
        }
        out.push(';');
        Ok(())
    }

    /// Interpolate raw SQL: `??` consumes the next bind as an identifier,
    /// `?` as a literal.
    fn write_raw(&self, out: &mut String, sql: &str, binds: &[Value]) -> Result<()> {
        let mut binds = binds.iter();
        let mut rest = sql;
        while let Some(i) = rest.find('?') {
            out.push_str(&rest[..i]);
            let value = binds
                .next()
                .ok_or_else(|| Error::msg(format!("missing bind for placeholder in {:?}", sql)))?;
            if rest[i + 1..].starts_with('?') {
                let Value::Varchar(Some(name)) = value else {
                    return Err(Error::msg(format!(
                        "identifier placeholder needs a string bind, got {:?}",
                        value
                    )));
                };
                self.write_identifier(out, name);
                rest = &rest[i + 2..];
            } else {
                self.write_value(out, value);
                rest = &rest[i + 1..];
            }
        }
        out.push_str(rest);
        Ok(())
    }
}

/// The MySQL writer, entirely made of the trait defaults.
#[derive(Clone, Copy, Default)]
pub struct MySqlWriter;

impl MySqlWriter {
    pub const fn new() -> Self {
        Self
    }
}

impl SqlWriter for MySqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}
