use crate::{AsValue, Record, Value};

/// Implicit primary key field used when a predicate is given as a bare key.
pub const KEY_FIELD: &str = "id";

/// Normalized predicate of UPDATE/DELETE/SELECT statements.
///
/// A bare scalar or sequence is always an equality test on [`KEY_FIELD`]; a
/// mapping is an implicit AND of equalities. `All` is the only way to compile
/// an unconditional UPDATE or DELETE: a filter that normalizes to an empty
/// mapping is rejected by the writer instead of matching every row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Explicit match-all marker.
    All,
    /// `KEY_FIELD = value`, flags the result for single-row unpacking.
    Key(Value),
    /// `KEY_FIELD IN (values)`.
    Keys(Vec<Value>),
    /// AND of `field = value` tests (`field IS NULL` for null values).
    Fields(Vec<(String, Value)>),
}

impl Filter {
    pub fn key(value: impl AsValue) -> Self {
        Filter::Key(value.as_value())
    }
    pub fn keys<V: AsValue>(values: impl IntoIterator<Item = V>) -> Self {
        Filter::Keys(values.into_iter().map(AsValue::as_value).collect())
    }
    pub fn field(name: impl Into<String>, value: impl AsValue) -> Self {
        Filter::Fields(vec![(name.into(), value.as_value())])
    }
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::All | Filter::Key(_) => false,
            Filter::Keys(values) => values.is_empty(),
            Filter::Fields(fields) => fields.is_empty(),
        }
    }
    /// Whether the predicate identifies at most one row by its key.
    pub fn selects_single_row(&self) -> bool {
        matches!(self, Filter::Key(_))
    }
}

macro_rules! impl_from_key {
    ($($source:ty),+ $(,)?) => {
        $(impl From<$source> for Filter {
            fn from(value: $source) -> Self {
                Filter::Key(value.as_value())
            }
        })+
    };
}

impl_from_key!(i8, i16, i32, i64, u8, u16, u32, u64, &str, String, uuid::Uuid);

impl From<Value> for Filter {
    fn from(value: Value) -> Self {
        Filter::Key(value)
    }
}

impl From<Vec<Value>> for Filter {
    fn from(values: Vec<Value>) -> Self {
        Filter::Keys(values)
    }
}

impl From<Record> for Filter {
    fn from(record: Record) -> Self {
        Filter::Fields(record.into_iter().collect())
    }
}
