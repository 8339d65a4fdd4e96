//! Runtime values.

use std::cmp::Ordering;
use std::fmt;

use drover_plan::logical::{DataType, Literal};

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// 64-bit floating point.
    Double(f64),
    /// Character data.
    CharArray(String),
    /// Uninterpreted bytes.
    ByteArray(Vec<u8>),
}

impl Value {
    /// Creates a boolean value.
    pub fn boolean(v: bool) -> Self {
        Value::Boolean(v)
    }

    /// Creates a long value.
    pub fn long(v: i64) -> Self {
        Value::Long(v)
    }

    /// Creates a double value.
    pub fn double(v: f64) -> Self {
        Value::Double(v)
    }

    /// Creates a character value.
    pub fn chararray(v: impl Into<String>) -> Self {
        Value::CharArray(v.into())
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true for numeric values.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Long(_) | Value::Double(_))
    }

    /// Returns the boolean payload, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Converts this value to an i64.
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Value::Boolean(b) => Some(i64::from(*b)),
            Value::Int(i) => Some(i64::from(*i)),
            Value::Long(i) => Some(*i),
            Value::Double(f) => Some(*f as i64),
            Value::CharArray(s) => s.parse().ok(),
            Value::Null | Value::ByteArray(_) => None,
        }
    }

    /// Converts this value to an f64.
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(f64::from(*i)),
            Value::Long(i) => Some(*i as f64),
            Value::Double(f) => Some(*f),
            Value::CharArray(s) => s.parse().ok(),
            Value::Null | Value::ByteArray(_) => None,
        }
    }

    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Null => DataType::Unknown,
            Value::Boolean(_) => DataType::Boolean,
            Value::Int(_) => DataType::Int,
            Value::Long(_) => DataType::Long,
            Value::Double(_) => DataType::Double,
            Value::CharArray(_) => DataType::CharArray,
            Value::ByteArray(_) => DataType::ByteArray,
        }
    }

    /// Casts this value to the specified type.
    pub fn cast(&self, target: DataType) -> Result<Value, String> {
        if self.is_null() {
            return Ok(Value::Null);
        }

        match target {
            DataType::Boolean => match self {
                Value::Boolean(b) => Ok(Value::Boolean(*b)),
                Value::CharArray(s) => s
                    .parse()
                    .map(Value::Boolean)
                    .map_err(|_| format!("cannot cast '{s}' to boolean")),
                other => Err(format!("cannot cast {} to boolean", other.data_type())),
            },
            DataType::Int => self
                .to_i64()
                .and_then(|v| i32::try_from(v).ok())
                .map(Value::Int)
                .ok_or_else(|| format!("cannot cast {self} to int")),
            DataType::Long => self
                .to_i64()
                .map(Value::Long)
                .ok_or_else(|| format!("cannot cast {self} to long")),
            DataType::Double => self
                .to_f64()
                .map(Value::Double)
                .ok_or_else(|| format!("cannot cast {self} to double")),
            DataType::CharArray => Ok(Value::CharArray(self.to_string())),
            DataType::ByteArray => Ok(Value::ByteArray(self.to_string().into_bytes())),
            other => Err(format!("unsupported cast to {other}")),
        }
    }

    /// Creates a value from a plan literal.
    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Value::Null,
            Literal::Boolean(b) => Value::Boolean(*b),
            Literal::Int(i) => Value::Long(*i),
            Literal::Double(f) => Value::Double(*f),
            Literal::CharArray(s) => Value::CharArray(s.clone()),
        }
    }

    /// Compares two non-null values of compatible types.
    ///
    /// Numbers compare across widths; other types only with themselves.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
            (Value::CharArray(a), Value::CharArray(b)) => Some(a.cmp(b)),
            (Value::ByteArray(a), Value::ByteArray(b)) => Some(a.cmp(b)),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                let (a, b) = (a.to_f64()?, b.to_f64()?);
                a.partial_cmp(&b)
            }
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::$variant(v.into())
                }
            }
        )*
    };
}

impl_from!(
    bool => Boolean,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    String => CharArray,
    &str => CharArray,
    Vec<u8> => ByteArray,
);

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Null, _) | (_, Value::Null) => false,
            (a, b) => a.compare(b) == Some(Ordering::Equal),
        }
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Long(i) => write!(f, "{i}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::CharArray(s) => write!(f, "{s}"),
            Value::ByteArray(b) => write!(f, "{}", String::from_utf8_lossy(b)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_null() {
        let v = Value::Null;
        assert!(v.is_null());
        assert_eq!(v.as_bool(), None);
        assert_eq!(v.cast(DataType::Long).unwrap(), Value::Null);
    }

    #[test]
    fn test_value_comparison() {
        assert_eq!(Value::long(10).compare(&Value::long(20)), Some(Ordering::Less));
        assert_eq!(Value::Int(10), Value::long(10));
        assert_eq!(Value::long(10), Value::double(10.0));
        assert_ne!(Value::Null, Value::long(0));
        assert_eq!(Value::boolean(true).compare(&Value::long(1)), None);
    }

    #[test]
    fn test_value_from_literal() {
        assert_eq!(Value::from_literal(&Literal::Int(42)), Value::long(42));
        assert_eq!(
            Value::from_literal(&Literal::CharArray("hello".into())),
            Value::chararray("hello")
        );
    }

    #[test]
    fn test_value_cast() {
        assert_eq!(
            Value::chararray("42").cast(DataType::Int).unwrap(),
            Value::Int(42)
        );
        assert_eq!(
            Value::long(42).cast(DataType::CharArray).unwrap(),
            Value::chararray("42")
        );
        assert!(Value::long(i64::MAX).cast(DataType::Int).is_err());
        assert!(Value::long(1).cast(DataType::Boolean).is_err());
    }
}
