//! Physical operators.
//!
//! Unlike logical operators, which describe intent, physical operators are the
//! units the stage compiler partitions. Every operator names its inputs in
//! order; the plan's edges must agree with them.

use std::fmt;

use drover_common::OperatorKey;
use drover_plan::PlanNode;
use serde::{Deserialize, Serialize};

use super::visitor::PhysicalVisitor;
use crate::eval::ExprSpec;
use drover_plan::VisitorResult;

/// How an operator moves tuples between partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Redistribution {
    /// Tuples stay in their partition.
    None,
    /// Tuples are repartitioned by a hash of their key.
    Hash,
    /// Tuples are range-partitioned into a total order.
    TotalOrder,
}

impl Redistribution {
    /// Returns true if the operator needs repartitioned input.
    pub fn is_boundary(self) -> bool {
        self != Redistribution::None
    }
}

impl fmt::Display for Redistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Redistribution::None => write!(f, "none"),
            Redistribution::Hash => write!(f, "hash"),
            Redistribution::TotalOrder => write!(f, "total order"),
        }
    }
}

/// What a physical operator does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PhysicalKind {
    /// Reads a storage location.
    Load {
        /// Location to read.
        location: String,
    },
    /// Writes a storage location.
    Store {
        /// Location to write.
        location: String,
    },
    /// Keeps tuples matching the condition.
    Filter {
        /// The condition.
        condition: ExprSpec,
    },
    /// Produces one output column per expression.
    ForEach {
        /// Output column expressions.
        generate: Vec<ExprSpec>,
    },
    /// Keeps the first `count` tuples.
    Limit {
        /// Number of tuples kept.
        count: usize,
    },
    /// Concatenates its inputs.
    Union,
    /// Feeds its input to several consumers.
    Split,
    /// Groups by key columns.
    Group {
        /// Key columns.
        keys: Vec<usize>,
        /// Requested number of partitions.
        #[serde(default)]
        parallelism: Option<usize>,
    },
    /// Groups several inputs by per-input key columns.
    Cogroup {
        /// Key columns, one list per input.
        keys: Vec<Vec<usize>>,
        /// Requested number of partitions.
        #[serde(default)]
        parallelism: Option<usize>,
    },
    /// Joins several inputs on per-input key columns.
    Join {
        /// Key columns, one list per input.
        keys: Vec<Vec<usize>>,
        /// Requested number of partitions.
        #[serde(default)]
        parallelism: Option<usize>,
    },
    /// Removes duplicate tuples.
    Distinct {
        /// Requested number of partitions.
        #[serde(default)]
        parallelism: Option<usize>,
    },
    /// Orders tuples globally.
    Sort {
        /// Sort columns.
        keys: Vec<usize>,
        /// Direction per sort column; ascending when absent.
        #[serde(default)]
        ascending: Vec<bool>,
        /// Requested number of partitions.
        #[serde(default)]
        parallelism: Option<usize>,
    },
}

impl PhysicalKind {
    /// Returns the operator name used in plan output.
    pub fn name(&self) -> &'static str {
        match self {
            PhysicalKind::Load { .. } => "Load",
            PhysicalKind::Store { .. } => "Store",
            PhysicalKind::Filter { .. } => "Filter",
            PhysicalKind::ForEach { .. } => "ForEach",
            PhysicalKind::Limit { .. } => "Limit",
            PhysicalKind::Union => "Union",
            PhysicalKind::Split => "Split",
            PhysicalKind::Group { .. } => "Group",
            PhysicalKind::Cogroup { .. } => "Cogroup",
            PhysicalKind::Join { .. } => "Join",
            PhysicalKind::Distinct { .. } => "Distinct",
            PhysicalKind::Sort { .. } => "Sort",
        }
    }

    /// Returns how the operator moves tuples between partitions.
    pub fn redistribution(&self) -> Redistribution {
        match self {
            PhysicalKind::Group { .. }
            | PhysicalKind::Cogroup { .. }
            | PhysicalKind::Join { .. }
            | PhysicalKind::Distinct { .. } => Redistribution::Hash,
            PhysicalKind::Sort { .. } => Redistribution::TotalOrder,
            _ => Redistribution::None,
        }
    }

    /// Returns the parallelism requested by a redistribution operator.
    pub fn requested_parallelism(&self) -> Option<usize> {
        match self {
            PhysicalKind::Group { parallelism, .. }
            | PhysicalKind::Cogroup { parallelism, .. }
            | PhysicalKind::Join { parallelism, .. }
            | PhysicalKind::Distinct { parallelism }
            | PhysicalKind::Sort { parallelism, .. } => *parallelism,
            _ => None,
        }
    }

    /// Returns the accepted number of inputs as `(min, max)`.
    pub fn arity(&self) -> (usize, Option<usize>) {
        match self {
            PhysicalKind::Load { .. } => (0, Some(0)),
            PhysicalKind::Union | PhysicalKind::Cogroup { .. } | PhysicalKind::Join { .. } => {
                (1, None)
            }
            _ => (1, Some(1)),
        }
    }

    fn detail(&self) -> Option<String> {
        match self {
            PhysicalKind::Load { location } | PhysicalKind::Store { location } => {
                Some(location.clone())
            }
            PhysicalKind::Filter { condition } => Some(condition.to_string()),
            PhysicalKind::ForEach { generate } => Some(
                generate
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            PhysicalKind::Limit { count } => Some(count.to_string()),
            PhysicalKind::Group { keys, .. } | PhysicalKind::Sort { keys, .. } => {
                Some(format!("{keys:?}"))
            }
            PhysicalKind::Cogroup { keys, .. } | PhysicalKind::Join { keys, .. } => {
                Some(format!("{keys:?}"))
            }
            PhysicalKind::Union | PhysicalKind::Split | PhysicalKind::Distinct { .. } => None,
        }
    }
}

/// A physical operator.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalOperator {
    /// Operator identity.
    pub key: OperatorKey,
    /// What the operator does.
    pub kind: PhysicalKind,
    /// Producers feeding this operator, in order.
    pub inputs: Vec<OperatorKey>,
}

impl PhysicalOperator {
    /// Creates an operator.
    pub fn new(key: OperatorKey, kind: PhysicalKind, inputs: Vec<OperatorKey>) -> Self {
        Self { key, kind, inputs }
    }

    /// Returns how the operator moves tuples between partitions.
    pub fn redistribution(&self) -> Redistribution {
        self.kind.redistribution()
    }

    /// Returns a one-line description including the operator's arguments.
    pub fn describe(&self) -> String {
        match self.kind.detail() {
            Some(detail) => format!("{} ({detail})", self.name()),
            None => self.name(),
        }
    }

    /// Dispatches this operator to the visitor operation for its kind.
    pub fn accept<V: PhysicalVisitor + ?Sized>(&self, visitor: &mut V) -> VisitorResult<()> {
        match &self.kind {
            PhysicalKind::Load { .. } => visitor.visit_load(self),
            PhysicalKind::Store { .. } => visitor.visit_store(self),
            PhysicalKind::Filter { .. }
            | PhysicalKind::ForEach { .. }
            | PhysicalKind::Limit { .. }
            | PhysicalKind::Split => visitor.visit_pipeline(self),
            PhysicalKind::Union => visitor.visit_union(self),
            PhysicalKind::Group { .. }
            | PhysicalKind::Cogroup { .. }
            | PhysicalKind::Join { .. }
            | PhysicalKind::Distinct { .. } => visitor.visit_hash_redistribution(self),
            PhysicalKind::Sort { .. } => visitor.visit_sort(self),
        }
    }
}

impl PlanNode for PhysicalOperator {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn name(&self) -> String {
        format!("{}[bag] - {}", self.kind.name(), self.key)
    }

    fn declared_inputs(&self) -> Option<&[OperatorKey]> {
        Some(&self.inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redistribution() {
        let group = PhysicalKind::Group {
            keys: vec![0],
            parallelism: Some(4),
        };
        assert_eq!(group.redistribution(), Redistribution::Hash);
        assert_eq!(group.requested_parallelism(), Some(4));

        let sort = PhysicalKind::Sort {
            keys: vec![1],
            ascending: vec![],
            parallelism: None,
        };
        assert_eq!(sort.redistribution(), Redistribution::TotalOrder);
        assert!(sort.redistribution().is_boundary());

        assert!(!PhysicalKind::Split.redistribution().is_boundary());
        assert_eq!(PhysicalKind::Union.arity(), (1, None));
    }

    #[test]
    fn test_names() {
        let op = PhysicalOperator::new(
            OperatorKey::new("scope", 4),
            PhysicalKind::Limit { count: 10 },
            vec![OperatorKey::new("scope", 3)],
        );
        assert_eq!(op.name(), "Limit[bag] - scope-4");
        assert_eq!(op.describe(), "Limit[bag] - scope-4 (10)");
    }
}
