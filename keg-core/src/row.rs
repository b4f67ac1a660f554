use crate::Value;
use std::sync::Arc;

/// Shared reference-counted column name list.
pub type RowNames = Arc<[String]>;
/// Owned row value slice matching `RowNames` length.
pub type Row = Box<[Value]>;

/// A result row with its corresponding column labels.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLabeled {
    /// Column names.
    pub labels: RowNames,
    /// Data values (aligned by index with `labels`).
    pub values: Row,
}

impl RowLabeled {
    pub fn new(labels: RowNames, values: Row) -> Self {
        Self { labels, values }
    }
    pub fn names(&self) -> &[String] {
        &self.labels
    }
    pub fn values(&self) -> &[Value] {
        &self.values
    }
    pub fn get_column(&self, name: &str) -> Option<&Value> {
        self.labels
            .iter()
            .position(|v| v == name)
            .map(|i| &self.values[i])
    }
}

/// Metadata about modify operations (INSERT/UPDATE/DELETE).
#[derive(Default, Debug, Clone, Copy)]
pub struct RowsAffected {
    /// Total number of rows impacted.
    pub rows_affected: u64,
    /// Backend-specific last inserted identifier when available.
    pub last_insert_id: Option<i64>,
}

impl Extend<RowsAffected> for RowsAffected {
    fn extend<T: IntoIterator<Item = RowsAffected>>(&mut self, iter: T) {
        for elem in iter {
            self.rows_affected += elem.rows_affected;
            if elem.last_insert_id.is_some() {
                self.last_insert_id = elem.last_insert_id;
            }
        }
    }
}

/// An ordered field to value mapping: the write payload of INSERT/UPDATE and
/// the unit consumed by the row sinks. Field order is preserved so compiled
/// SQL is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(Vec<(String, Value)>);

impl Record {
    pub fn new() -> Self {
        Self(Vec::new())
    }
    pub fn push(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.push((field.into(), value.into()));
    }
    /// Builder flavor of [`push`](Self::push).
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(field, value);
        self
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.iter().find(|(name, _)| name == field).map(|(_, v)| v)
    }
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }
    pub fn iter(&self) -> impl Iterator<Item = &(String, Value)> {
        self.0.iter()
    }
    /// Keep only the listed fields, preserving the record's own order.
    pub fn pick(&self, fields: &[&str]) -> Record {
        Record(
            self.0
                .iter()
                .filter(|(name, _)| fields.contains(&name.as_str()))
                .cloned()
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Record {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Builds a [`Record`] from `field => value` pairs.
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($field:expr => $value:expr),+ $(,)?) => {{
        let mut record = $crate::Record::new();
        $(record.push($field, $value);)+
        record
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;

    #[test]
    fn record_preserves_order_and_picks() {
        let record = record!["name" => "Adam", "gender" => "male", "id" => 2i64];
        assert_eq!(
            record.fields().collect::<Vec<_>>(),
            ["name", "gender", "id"]
        );
        assert_eq!(record.get("gender"), Some(&Value::from("male")));
        let picked = record.pick(&["id", "name"]);
        assert_eq!(picked.fields().collect::<Vec<_>>(), ["name", "id"]);
    }

    #[test]
    fn push_accepts_converted_and_plain_values() {
        let mut record = Record::new();
        record.push("id", Value::Null);
        record.push("age", 30i64);
        record.push("nickname", Option::<&str>::None);
        assert!(record.get("id").unwrap().is_null());
        assert_eq!(record.get("age"), Some(&Value::Int64(Some(30))));
        assert_eq!(record.get("nickname"), Some(&Value::Varchar(None)));
    }

    #[test]
    fn row_lookup_by_label() {
        let row = RowLabeled::new(
            Arc::from(vec!["id".to_owned(), "name".to_owned()]),
            Box::new([Value::from(1i64), Value::from("God")]),
        );
        assert_eq!(row.get_column("name"), Some(&Value::from("God")));
        assert_eq!(row.get_column("missing"), None);
    }
}
