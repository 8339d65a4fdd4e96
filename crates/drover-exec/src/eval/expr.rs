//! Expression operators.
//!
//! Expressions are pulled once per input tuple. Each composing operator pulls
//! its operands left to right and returns the first non-OK result unchanged.

use std::fmt;

use drover_common::OperatorKey;
use drover_plan::logical::DataType;
use serde::{Deserialize, Serialize};

use super::{EvalError, Next};
use crate::value::{Tuple, Value};

/// An operator producing one value per input tuple.
pub trait ExpressionOperator: fmt::Debug + Send {
    /// Returns the operator's key.
    fn key(&self) -> &OperatorKey;

    /// Returns the type of the values this operator produces.
    fn result_type(&self) -> DataType;

    /// Returns the operator kind, e.g. `Or`.
    fn kind(&self) -> &'static str;

    /// Returns the display name, e.g. `Or[boolean] - scope-3`.
    fn name(&self) -> String {
        format!("{}[{}] - {}", self.kind(), self.result_type(), self.key())
    }

    /// Produces the value for `input`.
    fn get_next(&mut self, input: &Tuple) -> Next<Value>;
}

/// An owned expression operator.
pub type BoxedExpr = Box<dyn ExpressionOperator>;

/// Pulls an operand and returns from the caller unless the status is OK.
macro_rules! pull {
    ($operand:expr, $input:expr) => {
        match $operand.get_next($input) {
            Next::Ok(value) => value,
            other => return other,
        }
    };
}

/// Unwraps a `Result<_, EvalError>` or returns it as the error status.
macro_rules! try_eval {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(err) => return Next::Error(err),
        }
    };
}

fn expect_boolean(key: &OperatorKey, value: &Value) -> Result<bool, EvalError> {
    value.as_bool().ok_or_else(|| EvalError::TypeMismatch {
        operator: key.clone(),
        expected: DataType::Boolean,
        found: value.data_type(),
    })
}

/// A constant. A null constant yields the null status.
#[derive(Debug)]
pub struct ConstantExpr {
    key: OperatorKey,
    value: Value,
}

impl ConstantExpr {
    /// Creates a constant.
    pub fn new(key: OperatorKey, value: Value) -> Self {
        Self { key, value }
    }
}

impl ExpressionOperator for ConstantExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        self.value.data_type()
    }

    fn kind(&self) -> &'static str {
        "Constant"
    }

    fn get_next(&mut self, _input: &Tuple) -> Next<Value> {
        if self.value.is_null() {
            Next::Null
        } else {
            Next::Ok(self.value.clone())
        }
    }
}

/// A column of the input tuple.
#[derive(Debug)]
pub struct ProjectExpr {
    key: OperatorKey,
    column: usize,
    result_type: DataType,
}

impl ProjectExpr {
    /// Creates a projection of `column`.
    pub fn new(key: OperatorKey, column: usize, result_type: DataType) -> Self {
        Self {
            key,
            column,
            result_type,
        }
    }

    /// Returns the projected column.
    pub fn column(&self) -> usize {
        self.column
    }
}

impl ExpressionOperator for ProjectExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        self.result_type
    }

    fn kind(&self) -> &'static str {
        "Project"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        match input.get(self.column) {
            None => Next::Error(EvalError::ColumnOutOfRange {
                operator: self.key.clone(),
                column: self.column,
                width: input.len(),
            }),
            Some(Value::Null) => Next::Null,
            Some(value) => Next::Ok(value.clone()),
        }
    }
}

/// Short-circuit boolean OR.
#[derive(Debug)]
pub struct OrExpr {
    key: OperatorKey,
    lhs: BoxedExpr,
    rhs: BoxedExpr,
}

impl OrExpr {
    /// Creates `lhs OR rhs`.
    pub fn new(key: OperatorKey, lhs: BoxedExpr, rhs: BoxedExpr) -> Self {
        Self { key, lhs, rhs }
    }
}

impl ExpressionOperator for OrExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        DataType::Boolean
    }

    fn kind(&self) -> &'static str {
        "Or"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let left = pull!(self.lhs, input);
        let left = try_eval!(expect_boolean(&self.key, &left));
        if left {
            return Next::Ok(Value::Boolean(true));
        }

        let right = pull!(self.rhs, input);
        let right = try_eval!(expect_boolean(&self.key, &right));
        Next::Ok(Value::Boolean(left || right))
    }
}

/// Short-circuit boolean AND.
#[derive(Debug)]
pub struct AndExpr {
    key: OperatorKey,
    lhs: BoxedExpr,
    rhs: BoxedExpr,
}

impl AndExpr {
    /// Creates `lhs AND rhs`.
    pub fn new(key: OperatorKey, lhs: BoxedExpr, rhs: BoxedExpr) -> Self {
        Self { key, lhs, rhs }
    }
}

impl ExpressionOperator for AndExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        DataType::Boolean
    }

    fn kind(&self) -> &'static str {
        "And"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let left = pull!(self.lhs, input);
        let left = try_eval!(expect_boolean(&self.key, &left));
        if !left {
            return Next::Ok(Value::Boolean(false));
        }

        let right = pull!(self.rhs, input);
        let right = try_eval!(expect_boolean(&self.key, &right));
        Next::Ok(Value::Boolean(left && right))
    }
}

/// Boolean negation.
#[derive(Debug)]
pub struct NotExpr {
    key: OperatorKey,
    operand: BoxedExpr,
}

impl NotExpr {
    /// Creates `NOT operand`.
    pub fn new(key: OperatorKey, operand: BoxedExpr) -> Self {
        Self { key, operand }
    }
}

impl ExpressionOperator for NotExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        DataType::Boolean
    }

    fn kind(&self) -> &'static str {
        "Not"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let value = pull!(self.operand, input);
        let value = try_eval!(expect_boolean(&self.key, &value));
        Next::Ok(Value::Boolean(!value))
    }
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    /// Equal.
    #[serde(rename = "==")]
    Eq,
    /// Not equal.
    #[serde(rename = "!=")]
    Ne,
    /// Less than.
    #[serde(rename = "<")]
    Lt,
    /// Less than or equal.
    #[serde(rename = "<=")]
    Le,
    /// Greater than.
    #[serde(rename = ">")]
    Gt,
    /// Greater than or equal.
    #[serde(rename = ">=")]
    Ge,
}

impl CompareOp {
    fn kind(self) -> &'static str {
        match self {
            CompareOp::Eq => "EqualTo",
            CompareOp::Ne => "NotEqualTo",
            CompareOp::Lt => "LessThan",
            CompareOp::Le => "LTE",
            CompareOp::Gt => "GreaterThan",
            CompareOp::Ge => "GTE",
        }
    }

    fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::{Equal, Greater, Less};
        match self {
            CompareOp::Eq => ordering == Equal,
            CompareOp::Ne => ordering != Equal,
            CompareOp::Lt => ordering == Less,
            CompareOp::Le => ordering != Greater,
            CompareOp::Gt => ordering == Greater,
            CompareOp::Ge => ordering != Less,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{symbol}")
    }
}

/// Binary comparison.
#[derive(Debug)]
pub struct CompareExpr {
    key: OperatorKey,
    op: CompareOp,
    lhs: BoxedExpr,
    rhs: BoxedExpr,
}

impl CompareExpr {
    /// Creates `lhs op rhs`.
    pub fn new(key: OperatorKey, op: CompareOp, lhs: BoxedExpr, rhs: BoxedExpr) -> Self {
        Self { key, op, lhs, rhs }
    }
}

impl ExpressionOperator for CompareExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        DataType::Boolean
    }

    fn kind(&self) -> &'static str {
        self.op.kind()
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let left = pull!(self.lhs, input);
        let right = pull!(self.rhs, input);
        match left.compare(&right) {
            Some(ordering) => Next::Ok(Value::Boolean(self.op.holds(ordering))),
            None => Next::Error(EvalError::Incomparable {
                operator: self.key.clone(),
                lhs: left.data_type(),
                rhs: right.data_type(),
            }),
        }
    }
}

/// True when the operand is null.
#[derive(Debug)]
pub struct IsNullExpr {
    key: OperatorKey,
    operand: BoxedExpr,
}

impl IsNullExpr {
    /// Creates `operand IS NULL`.
    pub fn new(key: OperatorKey, operand: BoxedExpr) -> Self {
        Self { key, operand }
    }
}

impl ExpressionOperator for IsNullExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        DataType::Boolean
    }

    fn kind(&self) -> &'static str {
        "IsNull"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        match self.operand.get_next(input) {
            Next::Null => Next::Ok(Value::Boolean(true)),
            Next::Ok(value) => Next::Ok(Value::Boolean(value.is_null())),
            other => other,
        }
    }
}

/// Conditional: pulls only the branch the condition selects.
#[derive(Debug)]
pub struct BinCondExpr {
    key: OperatorKey,
    cond: BoxedExpr,
    lhs: BoxedExpr,
    rhs: BoxedExpr,
}

impl BinCondExpr {
    /// Creates `cond ? lhs : rhs`.
    pub fn new(key: OperatorKey, cond: BoxedExpr, lhs: BoxedExpr, rhs: BoxedExpr) -> Self {
        Self {
            key,
            cond,
            lhs,
            rhs,
        }
    }
}

impl ExpressionOperator for BinCondExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        self.lhs.result_type()
    }

    fn kind(&self) -> &'static str {
        "BinCond"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let cond = pull!(self.cond, input);
        if try_eval!(expect_boolean(&self.key, &cond)) {
            self.lhs.get_next(input)
        } else {
            self.rhs.get_next(input)
        }
    }
}

/// Conversion of the operand to another type. A null operand stays null.
#[derive(Debug)]
pub struct CastExpr {
    key: OperatorKey,
    operand: BoxedExpr,
    to: DataType,
}

impl CastExpr {
    /// Creates `(to) operand`.
    pub fn new(key: OperatorKey, operand: BoxedExpr, to: DataType) -> Self {
        Self { key, operand, to }
    }
}

impl ExpressionOperator for CastExpr {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn result_type(&self) -> DataType {
        self.to
    }

    fn kind(&self) -> &'static str {
        "Cast"
    }

    fn get_next(&mut self, input: &Tuple) -> Next<Value> {
        let value = pull!(self.operand, input);
        match value.cast(self.to) {
            Ok(Value::Null) => Next::Null,
            Ok(cast) => Next::Ok(cast),
            Err(message) => Next::Error(EvalError::failed(&self.key, message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use drover_common::KeyGenerator;

    use super::*;
    use crate::tuple;

    fn constant(keys: &mut KeyGenerator, value: impl Into<Value>) -> BoxedExpr {
        Box::new(ConstantExpr::new(keys.next_key(), value.into()))
    }

    fn column(keys: &mut KeyGenerator, index: usize) -> BoxedExpr {
        Box::new(ProjectExpr::new(keys.next_key(), index, DataType::Long))
    }

    #[test]
    fn test_names() {
        let mut keys = KeyGenerator::new("test");
        let lhs = constant(&mut keys, true);
        let rhs = constant(&mut keys, false);
        let or = OrExpr::new(keys.next_key(), lhs, rhs);
        assert_eq!(or.name(), "Or[boolean] - test-3");
    }

    #[test]
    fn test_project() {
        let mut keys = KeyGenerator::new("p");
        let input = tuple![7i64, Value::Null];
        assert_eq!(column(&mut keys, 0).get_next(&input), Next::Ok(Value::long(7)));
        assert_eq!(column(&mut keys, 1).get_next(&input), Next::Null);
        assert!(matches!(
            column(&mut keys, 5).get_next(&input),
            Next::Error(EvalError::ColumnOutOfRange { column: 5, width: 2, .. })
        ));
    }

    #[test]
    fn test_compare() {
        let mut keys = KeyGenerator::new("c");
        let input = tuple![3i64, 4.5];
        let mut lt = CompareExpr::new(
            keys.next_key(),
            CompareOp::Lt,
            column(&mut keys, 0),
            column(&mut keys, 1),
        );
        assert_eq!(lt.get_next(&input), Next::Ok(Value::boolean(true)));

        let mut bad = CompareExpr::new(
            keys.next_key(),
            CompareOp::Eq,
            constant(&mut keys, "a"),
            constant(&mut keys, 1i64),
        );
        assert!(matches!(
            bad.get_next(&input),
            Next::Error(EvalError::Incomparable { .. })
        ));

        // A null operand stops the comparison.
        let mut null = CompareExpr::new(
            keys.next_key(),
            CompareOp::Ge,
            constant(&mut keys, Value::Null),
            column(&mut keys, 0),
        );
        assert_eq!(null.get_next(&input), Next::Null);
    }

    #[test]
    fn test_and_not_is_null() {
        let mut keys = KeyGenerator::new("b");
        let input = tuple![Value::Null];

        let mut and = AndExpr::new(
            keys.next_key(),
            constant(&mut keys, false),
            column(&mut keys, 7),
        );
        // Right operand would fail; the false left side decides.
        assert_eq!(and.get_next(&input), Next::Ok(Value::boolean(false)));

        let mut not = NotExpr::new(keys.next_key(), constant(&mut keys, true));
        assert_eq!(not.get_next(&input), Next::Ok(Value::boolean(false)));

        let mut not_long = NotExpr::new(keys.next_key(), constant(&mut keys, 1i64));
        assert!(matches!(
            not_long.get_next(&input),
            Next::Error(EvalError::TypeMismatch {
                expected: DataType::Boolean,
                found: DataType::Long,
                ..
            })
        ));

        let mut is_null = IsNullExpr::new(keys.next_key(), column(&mut keys, 0));
        assert_eq!(is_null.get_next(&input), Next::Ok(Value::boolean(true)));
    }

    #[test]
    fn test_bin_cond_pulls_selected_branch() {
        let mut keys = KeyGenerator::new("bc");
        let input = tuple![1i64];
        let mut pick_left = BinCondExpr::new(
            keys.next_key(),
            constant(&mut keys, true),
            constant(&mut keys, "yes"),
            column(&mut keys, 9),
        );
        assert_eq!(pick_left.get_next(&input), Next::Ok(Value::chararray("yes")));
        assert_eq!(pick_left.result_type(), DataType::CharArray);

        let mut pick_right = BinCondExpr::new(
            keys.next_key(),
            constant(&mut keys, false),
            column(&mut keys, 9),
            column(&mut keys, 0),
        );
        assert_eq!(pick_right.get_next(&input), Next::Ok(Value::long(1)));
    }

    #[test]
    fn test_cast() {
        let mut keys = KeyGenerator::new("cast");
        let input = tuple!["42", "x", Value::Null];

        let mut to_long = CastExpr::new(
            keys.next_key(),
            Box::new(ProjectExpr::new(keys.next_key(), 0, DataType::CharArray)),
            DataType::Long,
        );
        assert_eq!(to_long.name(), "Cast[long] - cast-1");
        assert_eq!(to_long.get_next(&input), Next::Ok(Value::long(42)));

        let mut bad = CastExpr::new(
            keys.next_key(),
            Box::new(ProjectExpr::new(keys.next_key(), 1, DataType::CharArray)),
            DataType::Int,
        );
        assert!(matches!(
            bad.get_next(&input),
            Next::Error(EvalError::Failed { .. })
        ));

        let mut null = CastExpr::new(keys.next_key(), column(&mut keys, 2), DataType::Double);
        assert_eq!(null.get_next(&input), Next::Null);
    }
}
