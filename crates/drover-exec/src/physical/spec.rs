//! JSON description of physical plans.

use std::collections::HashSet;

use drover_common::OperatorKey;
use drover_plan::{VisitorError, VisitorResult};
use serde::{Deserialize, Serialize};

use super::operator::{PhysicalKind, PhysicalOperator};
use super::PhysicalPlan;

/// A serializable physical plan.
///
/// ```json
/// {
///   "scope": "wordcount",
///   "operators": [
///     { "id": 1, "type": "load", "location": "input" },
///     { "id": 2, "type": "group", "inputs": [1], "keys": [0] },
///     { "id": 3, "type": "store", "inputs": [2], "location": "output" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSpec {
    /// Scope of every operator key in the plan.
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Operators; inputs may refer to operators listed later.
    pub operators: Vec<OperatorSpec>,
}

/// One operator of a [`PlanSpec`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorSpec {
    /// Id of the operator within the plan's scope.
    pub id: u64,
    /// Ids of the operators feeding this one, in order.
    #[serde(default)]
    pub inputs: Vec<u64>,
    /// What the operator does.
    #[serde(flatten)]
    pub kind: PhysicalKind,
}

fn default_scope() -> String {
    "plan".to_string()
}

impl PlanSpec {
    /// Parses a plan from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Renders the plan as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Describes an existing plan. Keys keep their ids; the scope is taken
    /// from the first operator.
    pub fn from_plan(plan: &PhysicalPlan) -> Self {
        let scope = plan
            .operators()
            .next()
            .map_or_else(default_scope, |op| op.key.scope.clone());
        let operators = plan
            .operators()
            .map(|op| OperatorSpec {
                id: op.key.id,
                inputs: op.inputs.iter().map(|k| k.id).collect(),
                kind: op.kind.clone(),
            })
            .collect();
        Self { scope, operators }
    }

    /// Builds the plan: adds every operator, then wires the inputs.
    pub fn build(&self) -> VisitorResult<PhysicalPlan> {
        let key = |id: u64| OperatorKey::new(self.scope.clone(), id);
        let mut plan = PhysicalPlan::new();
        for spec in &self.operators {
            plan.add(PhysicalOperator::new(
                key(spec.id),
                spec.kind.clone(),
                spec.inputs.iter().copied().map(key).collect(),
            ))?;
        }

        for spec in &self.operators {
            let to = key(spec.id);
            let mut seen = HashSet::new();
            for &input in &spec.inputs {
                if !seen.insert(input) {
                    return Err(VisitorError::DuplicateEdge {
                        from: key(input),
                        to,
                    });
                }
                let from = key(input);
                if !plan.contains(&from) {
                    return Err(VisitorError::UnresolvedInput {
                        operator: to,
                        input: from,
                    });
                }
                plan.connect(&from, &to)?;
            }
        }
        Ok(plan)
    }
}

impl From<&PhysicalPlan> for PlanSpec {
    fn from(plan: &PhysicalPlan) -> Self {
        Self::from_plan(plan)
    }
}
