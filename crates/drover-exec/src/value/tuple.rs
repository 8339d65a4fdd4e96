//! Tuple representation for evaluation.

use std::fmt;

use super::Value;

/// An ordered list of fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tuple {
    fields: Vec<Value>,
}

impl Tuple {
    /// Creates a tuple with the given fields.
    pub fn new(fields: Vec<Value>) -> Self {
        Self { fields }
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the tuple has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field at `index`.
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)
    }

    /// Appends a field.
    pub fn push(&mut self, value: Value) {
        self.fields.push(value);
    }

    /// Returns an iterator over the fields.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter()
    }

    /// Returns the fields as a slice.
    pub fn fields(&self) -> &[Value] {
        &self.fields
    }

    /// Consumes the tuple and returns its fields.
    pub fn into_fields(self) -> Vec<Value> {
        self.fields
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(fields: Vec<Value>) -> Self {
        Self::new(fields)
    }
}

impl FromIterator<Value> for Tuple {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// Builds a [`Tuple`] from values convertible into [`Value`].
#[macro_export]
macro_rules! tuple {
    () => {
        $crate::value::Tuple::default()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::value::Tuple::new(vec![$($crate::value::Value::from($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tuple_display() {
        let t = crate::tuple![1i64, "a", Value::Null, true];
        assert_eq!(t.len(), 4);
        assert_eq!(t.to_string(), "(1,a,,true)");
        assert_eq!(t.get(1), Some(&Value::chararray("a")));
        assert_eq!(t.get(9), None);
    }

    #[test]
    fn test_tuple_collect() {
        let t: Tuple = (1..=3).map(Value::long).collect();
        assert_eq!(t.fields(), &[Value::long(1), Value::long(2), Value::long(3)]);
        assert!(Tuple::default().is_empty());
    }
}
