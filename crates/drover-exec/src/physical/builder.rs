//! Programmatic construction of physical plans.

use drover_common::{KeyGenerator, OperatorKey};
use drover_plan::VisitorResult;

use super::operator::{PhysicalKind, PhysicalOperator};
use super::PhysicalPlan;
use crate::eval::ExprSpec;

/// Builds a [`PhysicalPlan`], drawing keys from one scope and wiring each
/// operator to its inputs.
///
/// # Example
///
/// ```rust
/// use drover_exec::physical::{PhysicalKind, PhysicalPlanBuilder};
///
/// let mut builder = PhysicalPlanBuilder::new("demo");
/// let load = builder.load("input").unwrap();
/// let group = builder
///     .add(PhysicalKind::Group { keys: vec![0], parallelism: None }, &[load])
///     .unwrap();
/// builder.store("output", &group).unwrap();
///
/// let plan = builder.build();
/// assert_eq!(plan.len(), 3);
/// ```
#[derive(Debug)]
pub struct PhysicalPlanBuilder {
    keys: KeyGenerator,
    plan: PhysicalPlan,
}

impl PhysicalPlanBuilder {
    /// Creates a builder whose keys live in `scope`.
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            keys: KeyGenerator::new(scope),
            plan: PhysicalPlan::new(),
        }
    }

    /// Adds an operator fed by `inputs`, in order.
    pub fn add(&mut self, kind: PhysicalKind, inputs: &[OperatorKey]) -> VisitorResult<OperatorKey> {
        let key = self.keys.next_key();
        let op = PhysicalOperator::new(key.clone(), kind, inputs.to_vec());
        self.plan.add_with_inputs(op, inputs)?;
        Ok(key)
    }

    /// Adds a load.
    pub fn load(&mut self, location: impl Into<String>) -> VisitorResult<OperatorKey> {
        self.add(
            PhysicalKind::Load {
                location: location.into(),
            },
            &[],
        )
    }

    /// Adds a filter of `input`.
    pub fn filter(&mut self, condition: ExprSpec, input: &OperatorKey) -> VisitorResult<OperatorKey> {
        self.add(PhysicalKind::Filter { condition }, std::slice::from_ref(input))
    }

    /// Adds a store of `input`.
    pub fn store(
        &mut self,
        location: impl Into<String>,
        input: &OperatorKey,
    ) -> VisitorResult<OperatorKey> {
        self.add(
            PhysicalKind::Store {
                location: location.into(),
            },
            std::slice::from_ref(input),
        )
    }

    /// Returns the plan under construction.
    pub fn plan(&self) -> &PhysicalPlan {
        &self.plan
    }

    /// Finishes the plan.
    pub fn build(self) -> PhysicalPlan {
        self.plan
    }
}
