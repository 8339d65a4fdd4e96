//! Logical operators.
//!
//! Structural operators (cogroup, generate, sort, filter, split, foreach) own
//! nested sub-plans. Expression operators own their operands directly.

use std::fmt;
use std::sync::Arc;

use drover_common::OperatorKey;
use serde::{Deserialize, Serialize};

use super::visitor::{dispatch, LogicalVisitor};
use super::LogicalPlan;
use crate::error::VisitorResult;
use crate::graph::PlanNode;

/// Data types of logical expressions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Not yet inferred.
    #[default]
    Unknown,
    /// `true` or `false`.
    Boolean,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// 64-bit float.
    Double,
    /// UTF-8 text.
    CharArray,
    /// Uninterpreted bytes.
    ByteArray,
    /// An ordered list of fields.
    Tuple,
    /// An unordered collection of tuples.
    Bag,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Unknown => "unknown",
            DataType::Boolean => "boolean",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Double => "double",
            DataType::CharArray => "chararray",
            DataType::ByteArray => "bytearray",
            DataType::Tuple => "tuple",
            DataType::Bag => "bag",
        };
        write!(f, "{name}")
    }
}

/// A literal constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// The null value.
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer; typed as long.
    Int(i64),
    /// A float.
    Double(f64),
    /// Text.
    CharArray(String),
}

impl Literal {
    /// Returns the type of the literal.
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Null => DataType::Unknown,
            Literal::Boolean(_) => DataType::Boolean,
            Literal::Int(_) => DataType::Long,
            Literal::Double(_) => DataType::Double,
            Literal::CharArray(_) => DataType::CharArray,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "null"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Int(i) => write!(f, "{i}"),
            Literal::Double(d) => write!(f, "{d}"),
            Literal::CharArray(s) => write!(f, "'{s}'"),
        }
    }
}

/// Binary expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Mod,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEq,
    /// `>`
    Greater,
    /// `>=`
    GreaterEq,
    /// Logical and.
    And,
    /// Logical or.
    Or,
}

impl BinaryOp {
    /// Returns true for operators that produce a boolean.
    pub fn is_boolean(&self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply | BinaryOp::Divide | BinaryOp::Mod
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOp::Add => "Add",
            BinaryOp::Subtract => "Subtract",
            BinaryOp::Multiply => "Multiply",
            BinaryOp::Divide => "Divide",
            BinaryOp::Mod => "Mod",
            BinaryOp::Equal => "Equal",
            BinaryOp::NotEqual => "NotEqual",
            BinaryOp::Less => "LessThan",
            BinaryOp::LessEq => "LessThanEqual",
            BinaryOp::Greater => "GreaterThan",
            BinaryOp::GreaterEq => "GreaterThanEqual",
            BinaryOp::And => "And",
            BinaryOp::Or => "Or",
        };
        write!(f, "{name}")
    }
}

/// Unary expression operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Logical negation.
    Not,
    /// Arithmetic negation.
    Negative,
    /// Null test.
    IsNull,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Not => write!(f, "Not"),
            UnaryOp::Negative => write!(f, "Negative"),
            UnaryOp::IsNull => write!(f, "IsNull"),
        }
    }
}

/// Reads from a storage location.
#[derive(Debug, Clone)]
pub struct Load {
    /// Operator key.
    pub key: OperatorKey,
    /// Location read.
    pub location: String,
}

/// Writes to a storage location.
#[derive(Debug, Clone)]
pub struct Store {
    /// Operator key.
    pub key: OperatorKey,
    /// Location written.
    pub location: String,
}

/// A constant value.
#[derive(Debug, Clone)]
pub struct Const {
    /// Operator key.
    pub key: OperatorKey,
    /// The constant.
    pub value: Literal,
}

/// Binary expression.
#[derive(Debug, Clone)]
pub struct Binary {
    /// Operator key.
    pub key: OperatorKey,
    /// The operator.
    pub op: BinaryOp,
    /// Left operand.
    pub lhs: Arc<LogicalOperator>,
    /// Right operand.
    pub rhs: Arc<LogicalOperator>,
}

/// Unary expression.
#[derive(Debug, Clone)]
pub struct Unary {
    /// Operator key.
    pub key: OperatorKey,
    /// The operator.
    pub op: UnaryOp,
    /// The operand.
    pub operand: Arc<LogicalOperator>,
}

/// Groups several inputs on per-input keys.
///
/// `group_by[i]` holds the grouping sub-plans of `inputs[i]`; an entry may be
/// absent when the input has no key in that position.
#[derive(Debug, Clone)]
pub struct Cogroup {
    /// Operator key.
    pub key: OperatorKey,
    /// Grouped inputs, in order.
    pub inputs: Vec<OperatorKey>,
    /// Grouping sub-plans, one list per input.
    pub group_by: Vec<Vec<Option<Arc<LogicalPlan>>>>,
    /// Requested number of partitions.
    pub requested_parallelism: Option<usize>,
}

impl Cogroup {
    /// Creates a cogroup with no inputs.
    pub fn new(key: OperatorKey) -> Self {
        Self {
            key,
            inputs: Vec::new(),
            group_by: Vec::new(),
            requested_parallelism: None,
        }
    }

    /// Adds an input with its grouping sub-plans.
    #[must_use]
    pub fn with_input(mut self, input: OperatorKey, plans: Vec<Option<Arc<LogicalPlan>>>) -> Self {
        self.inputs.push(input);
        self.group_by.push(plans);
        self
    }

    /// Returns the grouping sub-plans of `input`.
    pub fn group_by_plans(&self, input: &OperatorKey) -> &[Option<Arc<LogicalPlan>>] {
        self.inputs
            .iter()
            .position(|k| k == input)
            .and_then(|i| self.group_by.get(i))
            .map_or(&[], Vec::as_slice)
    }
}

/// Produces output columns, one sub-plan per column.
#[derive(Debug, Clone)]
pub struct Generate {
    /// Operator key.
    pub key: OperatorKey,
    /// One sub-plan per output column.
    pub plans: Vec<Arc<LogicalPlan>>,
    /// Per column, whether the column is flattened.
    pub flatten: Vec<bool>,
}

/// Orders the input, one sub-plan per sort key.
#[derive(Debug, Clone)]
pub struct Sort {
    /// Operator key.
    pub key: OperatorKey,
    /// One sub-plan per sort key.
    pub sort_plans: Vec<Arc<LogicalPlan>>,
    /// Per sort key, whether the order is ascending.
    pub ascending: Vec<bool>,
    /// Requested number of partitions.
    pub requested_parallelism: Option<usize>,
}

/// Keeps rows matching the condition sub-plan.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Operator key.
    pub key: OperatorKey,
    /// The condition sub-plan.
    pub condition: Arc<LogicalPlan>,
}

/// Routes rows to branches, one condition sub-plan per branch.
#[derive(Debug, Clone)]
pub struct Split {
    /// Operator key.
    pub key: OperatorKey,
    /// Branch conditions; absent for a branch taking every row.
    pub conditions: Vec<Option<Arc<LogicalPlan>>>,
}

/// Applies the nested plan to every row.
#[derive(Debug, Clone)]
pub struct ForEach {
    /// Operator key.
    pub key: OperatorKey,
    /// The nested plan.
    pub plan: Arc<LogicalPlan>,
}

/// Calls a user-defined function.
#[derive(Debug, Clone)]
pub struct UserFunc {
    /// Operator key.
    pub key: OperatorKey,
    /// Function name.
    pub name: String,
    /// Arguments, in order.
    pub args: Vec<Arc<LogicalOperator>>,
}

/// Conditional expression: `cond ? lhs : rhs`.
#[derive(Debug, Clone)]
pub struct BinCond {
    /// Operator key.
    pub key: OperatorKey,
    /// The condition.
    pub cond: Arc<LogicalOperator>,
    /// Left operand.
    pub lhs: Arc<LogicalOperator>,
    /// Right operand.
    pub rhs: Arc<LogicalOperator>,
}

/// Type conversion.
#[derive(Debug, Clone)]
pub struct Cast {
    /// Operator key.
    pub key: OperatorKey,
    /// Expression converted.
    pub expression: Arc<LogicalOperator>,
    /// Target type.
    pub to: DataType,
}

/// Regular expression match.
#[derive(Debug, Clone)]
pub struct Regexp {
    /// Operator key.
    pub key: OperatorKey,
    /// The operand.
    pub operand: Arc<LogicalOperator>,
    /// The pattern.
    pub pattern: String,
}

/// Column reference into the output of `expression`.
///
/// A set `sentinel` marks the reference as already resolved upstream; the
/// traversal does not descend into `expression` then.
#[derive(Debug, Clone)]
pub struct Project {
    /// Operator key.
    pub key: OperatorKey,
    /// Expression whose output is projected.
    pub expression: Arc<LogicalOperator>,
    /// Projected columns.
    pub columns: Vec<usize>,
    /// True once the reference was resolved upstream.
    pub sentinel: bool,
}

/// A logical operator.
#[derive(Debug, Clone)]
pub enum LogicalOperator {
    /// Reads a storage location.
    Load(Load),
    /// Writes a storage location.
    Store(Store),
    /// A constant.
    Const(Const),
    /// A binary expression.
    Binary(Binary),
    /// A unary expression.
    Unary(Unary),
    /// Groups several inputs.
    Cogroup(Cogroup),
    /// Produces output columns.
    Generate(Generate),
    /// Orders the input.
    Sort(Sort),
    /// Keeps matching rows.
    Filter(Filter),
    /// Routes rows to branches.
    Split(Split),
    /// Applies a nested plan per row.
    ForEach(ForEach),
    /// Calls a user function.
    UserFunc(UserFunc),
    /// A conditional expression.
    BinCond(BinCond),
    /// A type conversion.
    Cast(Cast),
    /// A regular expression match.
    Regexp(Regexp),
    /// A column reference.
    Project(Project),
}

macro_rules! impl_from_variant {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for LogicalOperator {
                fn from(op: $variant) -> Self {
                    LogicalOperator::$variant(op)
                }
            }
        )*

        impl LogicalOperator {
            /// Returns the operator's key.
            pub fn key(&self) -> &OperatorKey {
                match self {
                    $(LogicalOperator::$variant(op) => &op.key,)*
                }
            }

            /// Returns the variant name.
            pub fn kind(&self) -> &'static str {
                match self {
                    $(LogicalOperator::$variant(_) => stringify!($variant),)*
                }
            }
        }
    };
}

impl_from_variant!(
    Load, Store, Const, Binary, Unary, Cogroup, Generate, Sort, Filter, Split, ForEach,
    UserFunc, BinCond, Cast, Regexp, Project,
);

impl LogicalOperator {
    /// Dispatches this operator to the visitor operation for its variant.
    ///
    /// This is the only entry point into a visitor for a single operator.
    pub fn accept<V: LogicalVisitor + ?Sized>(&self, visitor: &mut V) -> VisitorResult<()> {
        dispatch(self, visitor)
    }

    /// Wraps the operator in an `Arc`, for use as an operand.
    pub fn shared(self) -> Arc<LogicalOperator> {
        Arc::new(self)
    }

    /// Returns true for operators that own nested sub-plans.
    pub fn has_sub_plans(&self) -> bool {
        matches!(
            self,
            LogicalOperator::Cogroup(_)
                | LogicalOperator::Generate(_)
                | LogicalOperator::Sort(_)
                | LogicalOperator::Filter(_)
                | LogicalOperator::Split(_)
                | LogicalOperator::ForEach(_)
        )
    }
}

impl PlanNode for LogicalOperator {
    fn key(&self) -> &OperatorKey {
        LogicalOperator::key(self)
    }

    fn name(&self) -> String {
        match self {
            LogicalOperator::Binary(b) => format!("{} - {}", b.op, b.key),
            LogicalOperator::Unary(u) => format!("{} - {}", u.op, u.key),
            LogicalOperator::Cast(c) => format!("Cast[{}] - {}", c.to, c.key),
            other => format!("{} - {}", other.kind(), other.key()),
        }
    }

    fn declared_inputs(&self) -> Option<&[OperatorKey]> {
        match self {
            LogicalOperator::Cogroup(cg) => Some(&cg.inputs),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> OperatorKey {
        OperatorKey::new("op", id)
    }

    #[test]
    fn test_names() {
        let c = LogicalOperator::from(Const {
            key: key(1),
            value: Literal::Int(5),
        });
        assert_eq!(c.name(), "Const - op-1");

        let cmp = LogicalOperator::from(Binary {
            key: key(2),
            op: BinaryOp::Greater,
            lhs: c.clone().shared(),
            rhs: c.shared(),
        });
        assert_eq!(cmp.name(), "GreaterThan - op-2");
        assert_eq!(cmp.kind(), "Binary");
        assert!(!cmp.has_sub_plans());
    }

    #[test]
    fn test_cogroup_inputs() {
        let cg = Cogroup::new(key(3))
            .with_input(key(1), vec![None])
            .with_input(key(2), vec![]);
        assert_eq!(cg.group_by_plans(&key(1)).len(), 1);
        assert!(cg.group_by_plans(&key(2)).is_empty());
        assert!(cg.group_by_plans(&key(9)).is_empty());

        let op = LogicalOperator::from(cg);
        assert_eq!(op.declared_inputs(), Some(&[key(1), key(2)][..]));
    }

    #[test]
    fn test_binary_op_types() {
        assert!(BinaryOp::Or.is_boolean());
        assert!(BinaryOp::LessEq.is_boolean());
        assert!(!BinaryOp::Mod.is_boolean());
        assert_eq!(Literal::Double(1.5).data_type(), DataType::Double);
    }
}
