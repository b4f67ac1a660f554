use crate::{Error, Result, RowLabeled, Value};

/// Post-processing hint attached to a descriptor at build time: how the raw
/// row set is reshaped before it reaches the caller.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Unpack {
    /// Hand the row sequence back untouched.
    #[default]
    Rows,
    /// Single-row lookup: first row or nothing.
    Row,
    /// Flatten to the named column's value sequence.
    Column(String),
    /// Single row and single column: one value or nothing.
    Cell(String),
    /// First value of the first row; aggregate scalars coerce to a numeric
    /// type unless the function preserves the column's native type.
    Scalar { keep_type: bool },
}

impl Unpack {
    pub fn apply(&self, rows: Vec<RowLabeled>) -> Payload {
        match self {
            Unpack::Rows => Payload::Rows(rows),
            Unpack::Row => Payload::Row(rows.into_iter().next()),
            Unpack::Column(name) => Payload::Column(
                rows.iter()
                    .map(|row| row.get_column(name).cloned().unwrap_or_default())
                    .collect(),
            ),
            Unpack::Cell(name) => Payload::Cell(
                rows.first()
                    .and_then(|row| row.get_column(name))
                    .cloned(),
            ),
            Unpack::Scalar { keep_type } => {
                let value = rows
                    .into_iter()
                    .next()
                    .and_then(|row| row.values.into_vec().into_iter().next())
                    .unwrap_or_default();
                Payload::Scalar(if *keep_type {
                    value
                } else {
                    value.coerce_numeric()
                })
            }
        }
    }
}

/// What a pipeline run hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Rows(Vec<RowLabeled>),
    Row(Option<RowLabeled>),
    Column(Vec<Value>),
    Cell(Option<Value>),
    Scalar(Value),
}

impl Payload {
    pub fn into_rows(self) -> Result<Vec<RowLabeled>> {
        match self {
            Payload::Rows(rows) => Ok(rows),
            other => Err(shape_error(&other)),
        }
    }
    pub fn into_row(self) -> Result<Option<RowLabeled>> {
        match self {
            Payload::Row(row) => Ok(row),
            other => Err(shape_error(&other)),
        }
    }
    pub fn into_column(self) -> Result<Vec<Value>> {
        match self {
            Payload::Column(values) => Ok(values),
            other => Err(shape_error(&other)),
        }
    }
    pub fn into_cell(self) -> Result<Option<Value>> {
        match self {
            Payload::Cell(value) => Ok(value),
            other => Err(shape_error(&other)),
        }
    }
    pub fn into_scalar(self) -> Result<Value> {
        match self {
            Payload::Scalar(value) => Ok(value),
            other => Err(shape_error(&other)),
        }
    }
}

fn shape_error(payload: &Payload) -> Error {
    Error::msg(format!(
        "pipeline produced an unexpected payload shape: {:?}",
        payload
    ))
}
