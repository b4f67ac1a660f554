use rust_decimal::{Decimal, prelude::ToPrimitive};
use time::{Date, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Scalar value exchanged with the transport.
///
/// Every variant carries an `Option` payload so that a value with `None`
/// doubles as a column type prototype (see [`ColumnDef`](crate::ColumnDef)).
#[derive(Default, Debug, Clone, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>, /* prec: */ u8, /* scale: */ u8),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Time(Option<Time>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v, ..) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Time(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int8(Some(v)) => Some(*v as i64),
            Value::Int16(Some(v)) => Some(*v as i64),
            Value::Int32(Some(v)) => Some(*v as i64),
            Value::Int64(Some(v)) => Some(*v),
            Value::UInt8(Some(v)) => Some(*v as i64),
            Value::UInt16(Some(v)) => Some(*v as i64),
            Value::UInt32(Some(v)) => Some(*v as i64),
            Value::UInt64(Some(v)) => i64::try_from(*v).ok(),
            Value::Decimal(Some(v), ..) => v.to_i64(),
            Value::Varchar(Some(v)) => v.parse().ok(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        self.as_i64().and_then(|v| u64::try_from(v).ok())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float32(Some(v)) => Some(*v as f64),
            Value::Float64(Some(v)) => Some(*v),
            Value::Decimal(Some(v), ..) => v.to_f64(),
            Value::Varchar(Some(v)) => v.parse().ok(),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Varchar(Some(v)) => Some(v),
            _ => None,
        }
    }

    /// Fold transport-typed aggregate results into a plain numeric value.
    ///
    /// MySQL reports SUM/AVG over integer columns as DECIMAL and some
    /// transports hand numbers back as text; integral values stay integral.
    pub fn coerce_numeric(self) -> Value {
        match &self {
            Value::Boolean(..)
            | Value::Int8(..)
            | Value::Int16(..)
            | Value::Int32(..)
            | Value::Int64(..)
            | Value::UInt8(..)
            | Value::UInt16(..)
            | Value::UInt32(..)
            | Value::UInt64(..)
            | Value::Float32(..)
            | Value::Float64(..) => self,
            v if v.is_null() => Value::Null,
            v => match (v.as_i64(), v.as_f64()) {
                (Some(int), Some(float)) if int as f64 == float => Value::Int64(Some(int)),
                (_, Some(float)) => Value::Float64(Some(float)),
                _ => self,
            },
        }
    }
}

pub trait AsValue {
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
}

macro_rules! impl_as_value {
    ($source:ty, $into:path $(, $args:tt)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $into(None $(, $args)*)
            }
            fn as_value(self) -> Value {
                $into(Some(self) $(, $args)*)
            }
        }
    };
}

impl_as_value!(bool, Value::Boolean);
impl_as_value!(i8, Value::Int8);
impl_as_value!(i16, Value::Int16);
impl_as_value!(i32, Value::Int32);
impl_as_value!(i64, Value::Int64);
impl_as_value!(u8, Value::UInt8);
impl_as_value!(u16, Value::UInt16);
impl_as_value!(u32, Value::UInt32);
impl_as_value!(u64, Value::UInt64);
impl_as_value!(f32, Value::Float32);
impl_as_value!(f64, Value::Float64);
impl_as_value!(Decimal, Value::Decimal, 0, 0);
impl_as_value!(String, Value::Varchar);
impl_as_value!(Box<[u8]>, Value::Blob);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(Uuid, Value::Uuid);

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::Varchar(None)
    }
    fn as_value(self) -> Value {
        Value::Varchar(Some(self.to_owned()))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_detection() {
        assert!(Value::Null.is_null());
        assert!(Value::Varchar(None).is_null());
        assert!(Option::<i64>::None.as_value().is_null());
        assert!(!42i64.as_value().is_null());
    }

    #[test]
    fn numeric_accessors() {
        assert_eq!(Value::from(7u8).as_i64(), Some(7));
        assert_eq!(Value::from("21").as_i64(), Some(21));
        assert_eq!(Value::from(3.5f64).as_f64(), Some(3.5));
        assert_eq!(Value::from("3.5").as_f64(), Some(3.5));
        assert_eq!(Value::from("abc").as_i64(), None);
    }

    #[test]
    fn coercion_keeps_integral_values_integral() {
        assert_eq!(Value::from("21").coerce_numeric(), Value::Int64(Some(21)));
        assert_eq!(
            Value::from("3.5").coerce_numeric(),
            Value::Float64(Some(3.5))
        );
        assert_eq!(Value::from(6i64).coerce_numeric(), Value::Int64(Some(6)));
        assert_eq!(Value::Varchar(None).coerce_numeric(), Value::Null);
        assert_eq!(
            Value::from("god").coerce_numeric(),
            Value::Varchar(Some("god".into()))
        );
    }
}
