//! Serializable expression descriptions.

use std::fmt;

use drover_common::KeyGenerator;
use drover_plan::logical::{DataType, Literal};
use serde::{Deserialize, Serialize};

use super::expr::{
    AndExpr, BinCondExpr, BoxedExpr, CastExpr, CompareExpr, CompareOp, ConstantExpr, IsNullExpr,
    NotExpr, OrExpr, ProjectExpr,
};
use crate::value::Value;

/// Description of an expression tree, as carried by physical plans.
///
/// # Example
///
/// ```rust
/// use drover_common::KeyGenerator;
/// use drover_exec::eval::{CompareOp, ExprSpec};
/// use drover_exec::{tuple, Next, Value};
/// use drover_plan::logical::Literal;
///
/// let spec = ExprSpec::compare(CompareOp::Gt, ExprSpec::column(0), ExprSpec::constant(Literal::Int(3)));
/// let mut expr = spec.build(&mut KeyGenerator::new("doc"));
/// assert_eq!(expr.get_next(&tuple![5i64]), Next::Ok(Value::boolean(true)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ExprSpec {
    /// A constant.
    Const {
        /// The constant value.
        value: Literal,
    },
    /// A column of the input tuple.
    Column {
        /// Column position.
        index: usize,
        /// Declared type of the column.
        #[serde(default)]
        data_type: DataType,
    },
    /// Short-circuit OR.
    Or {
        /// Left operand.
        lhs: Box<ExprSpec>,
        /// Right operand.
        rhs: Box<ExprSpec>,
    },
    /// Short-circuit AND.
    And {
        /// Left operand.
        lhs: Box<ExprSpec>,
        /// Right operand.
        rhs: Box<ExprSpec>,
    },
    /// Negation.
    Not {
        /// The negated operand.
        operand: Box<ExprSpec>,
    },
    /// Comparison.
    Compare {
        /// Comparison operator.
        cmp: CompareOp,
        /// Left operand.
        lhs: Box<ExprSpec>,
        /// Right operand.
        rhs: Box<ExprSpec>,
    },
    /// Null test.
    IsNull {
        /// The tested operand.
        operand: Box<ExprSpec>,
    },
    /// Conditional.
    BinCond {
        /// Condition.
        cond: Box<ExprSpec>,
        /// Value when the condition holds.
        lhs: Box<ExprSpec>,
        /// Value otherwise.
        rhs: Box<ExprSpec>,
    },
    /// Type conversion.
    Cast {
        /// The converted operand.
        operand: Box<ExprSpec>,
        /// Target type.
        to: DataType,
    },
}

impl ExprSpec {
    /// A constant.
    pub fn constant(value: Literal) -> Self {
        ExprSpec::Const { value }
    }

    /// A column of unknown type.
    pub fn column(index: usize) -> Self {
        ExprSpec::Column {
            index,
            data_type: DataType::Unknown,
        }
    }

    /// `lhs OR rhs`.
    pub fn or(lhs: ExprSpec, rhs: ExprSpec) -> Self {
        ExprSpec::Or {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `lhs AND rhs`.
    pub fn and(lhs: ExprSpec, rhs: ExprSpec) -> Self {
        ExprSpec::And {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `NOT operand`.
    pub fn not(operand: ExprSpec) -> Self {
        ExprSpec::Not {
            operand: Box::new(operand),
        }
    }

    /// `lhs cmp rhs`.
    pub fn compare(cmp: CompareOp, lhs: ExprSpec, rhs: ExprSpec) -> Self {
        ExprSpec::Compare {
            cmp,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `operand IS NULL`.
    pub fn is_null(operand: ExprSpec) -> Self {
        ExprSpec::IsNull {
            operand: Box::new(operand),
        }
    }

    /// `cond ? lhs : rhs`.
    pub fn bin_cond(cond: ExprSpec, lhs: ExprSpec, rhs: ExprSpec) -> Self {
        ExprSpec::BinCond {
            cond: Box::new(cond),
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// `(to) operand`.
    pub fn cast(operand: ExprSpec, to: DataType) -> Self {
        ExprSpec::Cast {
            operand: Box::new(operand),
            to,
        }
    }

    /// Builds the operator tree, drawing a fresh key for every node.
    ///
    /// A node's key is drawn before its operands' keys.
    pub fn build(&self, keys: &mut KeyGenerator) -> BoxedExpr {
        let key = keys.next_key();
        match self {
            ExprSpec::Const { value } => Box::new(ConstantExpr::new(key, Value::from_literal(value))),
            ExprSpec::Column { index, data_type } => {
                Box::new(ProjectExpr::new(key, *index, *data_type))
            }
            ExprSpec::Or { lhs, rhs } => {
                let lhs = lhs.build(keys);
                Box::new(OrExpr::new(key, lhs, rhs.build(keys)))
            }
            ExprSpec::And { lhs, rhs } => {
                let lhs = lhs.build(keys);
                Box::new(AndExpr::new(key, lhs, rhs.build(keys)))
            }
            ExprSpec::Not { operand } => Box::new(NotExpr::new(key, operand.build(keys))),
            ExprSpec::Compare { cmp, lhs, rhs } => {
                let lhs = lhs.build(keys);
                Box::new(CompareExpr::new(key, *cmp, lhs, rhs.build(keys)))
            }
            ExprSpec::IsNull { operand } => Box::new(IsNullExpr::new(key, operand.build(keys))),
            ExprSpec::BinCond { cond, lhs, rhs } => {
                let cond = cond.build(keys);
                let lhs = lhs.build(keys);
                Box::new(BinCondExpr::new(key, cond, lhs, rhs.build(keys)))
            }
            ExprSpec::Cast { operand, to } => Box::new(CastExpr::new(key, operand.build(keys), *to)),
        }
    }
}

impl fmt::Display for ExprSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprSpec::Const { value } => write!(f, "{value}"),
            ExprSpec::Column { index, .. } => write!(f, "${index}"),
            ExprSpec::Or { lhs, rhs } => write!(f, "({lhs} or {rhs})"),
            ExprSpec::And { lhs, rhs } => write!(f, "({lhs} and {rhs})"),
            ExprSpec::Not { operand } => write!(f, "not {operand}"),
            ExprSpec::Compare { cmp, lhs, rhs } => write!(f, "({lhs} {cmp} {rhs})"),
            ExprSpec::IsNull { operand } => write!(f, "{operand} is null"),
            ExprSpec::BinCond { cond, lhs, rhs } => write!(f, "({cond} ? {lhs} : {rhs})"),
            ExprSpec::Cast { operand, to } => write!(f, "({to}){operand}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::Next;
    use crate::tuple;

    fn sample() -> ExprSpec {
        ExprSpec::or(
            ExprSpec::is_null(ExprSpec::column(1)),
            ExprSpec::compare(
                CompareOp::Ge,
                ExprSpec::column(0),
                ExprSpec::constant(Literal::Int(10)),
            ),
        )
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "($1 is null or ($0 >= 10))");
    }

    #[test]
    fn test_build_and_evaluate() {
        let mut keys = KeyGenerator::new("s");
        let mut expr = sample().build(&mut keys);
        assert_eq!(expr.name(), "Or[boolean] - s-1");
        assert_eq!(expr.get_next(&tuple![3i64, Value::Null]), Next::Ok(Value::boolean(true)));
        assert_eq!(expr.get_next(&tuple![3i64, "x"]), Next::Ok(Value::boolean(false)));
        assert_eq!(expr.get_next(&tuple![12i64, "x"]), Next::Ok(Value::boolean(true)));
        assert_eq!(keys.next_key().id, 7);
    }

    #[test]
    fn test_json_shape() {
        let json = r#"{"op":"compare","cmp":"<","lhs":{"op":"column","index":2},"rhs":{"op":"const","value":{"Double":1.5}}}"#;
        let spec: ExprSpec = serde_json::from_str(json).unwrap();
        assert_eq!(
            spec,
            ExprSpec::compare(
                CompareOp::Lt,
                ExprSpec::column(2),
                ExprSpec::constant(Literal::Double(1.5))
            )
        );
    }

    #[test]
    fn test_cast_from_json() {
        let json = r#"{"op":"cast","to":"long","operand":{"op":"column","index":0}}"#;
        let spec: ExprSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.to_string(), "(long)$0");

        let mut expr = spec.build(&mut KeyGenerator::new("k"));
        assert_eq!(expr.name(), "Cast[long] - k-1");
        assert_eq!(expr.get_next(&tuple!["17"]), Next::Ok(Value::long(17)));
        assert!(matches!(expr.get_next(&tuple!["x"]), Next::Error(_)));
    }
}
