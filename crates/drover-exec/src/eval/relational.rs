//! Relational pull operators.
//!
//! A relational operator yields tuples until it reports end-of-data. Pulling
//! it again afterwards is a contract violation and yields
//! [`EvalError::Exhausted`].

use std::collections::VecDeque;
use std::fmt;

use drover_common::OperatorKey;
use drover_plan::logical::DataType;
use tracing::trace;

use super::expr::BoxedExpr;
use super::{EvalError, Next};
use crate::value::{Tuple, Value};

/// An operator producing a stream of tuples.
pub trait RelationalOperator: fmt::Debug + Send {
    /// Returns the operator's key.
    fn key(&self) -> &OperatorKey;

    /// Returns the operator kind, e.g. `Filter`.
    fn kind(&self) -> &'static str;

    /// Returns the display name, e.g. `Filter[bag] - scope-4`.
    fn name(&self) -> String {
        format!("{}[bag] - {}", self.kind(), self.key())
    }

    /// Produces the next tuple.
    fn get_next(&mut self) -> Next<Tuple>;
}

/// An owned relational operator.
pub type BoxedRelational = Box<dyn RelationalOperator>;

/// Tracks whether end-of-data was already reported.
#[derive(Debug, Default)]
struct Exhaustion {
    done: bool,
}

impl Exhaustion {
    fn check(&self, key: &OperatorKey) -> Result<(), EvalError> {
        if self.done {
            Err(EvalError::Exhausted {
                operator: key.clone(),
            })
        } else {
            Ok(())
        }
    }

    /// Records `next` and passes it through.
    fn observe<T>(&mut self, next: Next<T>) -> Next<T> {
        if matches!(next, Next::EndOfData) {
            self.done = true;
        }
        next
    }
}

/// In-memory rows.
#[derive(Debug)]
pub struct TupleSource {
    key: OperatorKey,
    rows: VecDeque<Tuple>,
    state: Exhaustion,
}

impl TupleSource {
    /// Creates a source yielding `rows` in order.
    pub fn new(key: OperatorKey, rows: impl IntoIterator<Item = Tuple>) -> Self {
        Self {
            key,
            rows: rows.into_iter().collect(),
            state: Exhaustion::default(),
        }
    }
}

impl RelationalOperator for TupleSource {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn kind(&self) -> &'static str {
        "Source"
    }

    fn get_next(&mut self) -> Next<Tuple> {
        if let Err(err) = self.state.check(&self.key) {
            return Next::Error(err);
        }
        let next = match self.rows.pop_front() {
            Some(row) => Next::Ok(row),
            None => Next::EndOfData,
        };
        self.state.observe(next)
    }
}

/// Keeps the tuples whose condition is true.
///
/// False and null conditions drop the tuple; any other non-OK status of the
/// input or the condition is returned unchanged.
#[derive(Debug)]
pub struct FilterTuples {
    key: OperatorKey,
    input: BoxedRelational,
    condition: BoxedExpr,
    state: Exhaustion,
}

impl FilterTuples {
    /// Creates a filter of `input` on `condition`.
    pub fn new(key: OperatorKey, input: BoxedRelational, condition: BoxedExpr) -> Self {
        Self {
            key,
            input,
            condition,
            state: Exhaustion::default(),
        }
    }

    fn pull(&mut self) -> Next<Tuple> {
        loop {
            let tuple = match self.input.get_next() {
                Next::Ok(tuple) => tuple,
                Next::Null => continue,
                other => return other,
            };
            match self.condition.get_next(&tuple) {
                Next::Ok(Value::Boolean(true)) => return Next::Ok(tuple),
                Next::Ok(Value::Boolean(false)) | Next::Null => {
                    trace!(filter = %self.key, %tuple, "Dropped tuple");
                }
                Next::Ok(other) => {
                    return Next::Error(EvalError::TypeMismatch {
                        operator: self.key.clone(),
                        expected: DataType::Boolean,
                        found: other.data_type(),
                    })
                }
                Next::EndOfData => return Next::EndOfData,
                Next::Error(err) => return Next::Error(err),
            }
        }
    }
}

impl RelationalOperator for FilterTuples {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn kind(&self) -> &'static str {
        "Filter"
    }

    fn get_next(&mut self) -> Next<Tuple> {
        if let Err(err) = self.state.check(&self.key) {
            return Next::Error(err);
        }
        let next = self.pull();
        self.state.observe(next)
    }
}

/// Evaluates one expression per output column.
///
/// A null status becomes a null field.
#[derive(Debug)]
pub struct ProjectTuples {
    key: OperatorKey,
    input: BoxedRelational,
    columns: Vec<BoxedExpr>,
    state: Exhaustion,
}

impl ProjectTuples {
    /// Creates a projection of `input`.
    pub fn new(key: OperatorKey, input: BoxedRelational, columns: Vec<BoxedExpr>) -> Self {
        Self {
            key,
            input,
            columns,
            state: Exhaustion::default(),
        }
    }

    fn pull(&mut self) -> Next<Tuple> {
        let tuple = match self.input.get_next() {
            Next::Ok(tuple) => tuple,
            other => return other,
        };
        let mut out = Tuple::default();
        for column in &mut self.columns {
            match column.get_next(&tuple) {
                Next::Ok(value) => out.push(value),
                Next::Null => out.push(Value::Null),
                Next::EndOfData => return Next::EndOfData,
                Next::Error(err) => return Next::Error(err),
            }
        }
        Next::Ok(out)
    }
}

impl RelationalOperator for ProjectTuples {
    fn key(&self) -> &OperatorKey {
        &self.key
    }

    fn kind(&self) -> &'static str {
        "ForEach"
    }

    fn get_next(&mut self) -> Next<Tuple> {
        if let Err(err) = self.state.check(&self.key) {
            return Next::Error(err);
        }
        let next = self.pull();
        self.state.observe(next)
    }
}

/// Pulls `op` until end-of-data and returns the tuples produced.
///
/// Null results are skipped; the first error is returned.
pub fn collect_tuples(op: &mut dyn RelationalOperator) -> Result<Vec<Tuple>, EvalError> {
    let mut out = Vec::new();
    loop {
        match op.get_next() {
            Next::Ok(tuple) => out.push(tuple),
            Next::Null => {}
            Next::EndOfData => return Ok(out),
            Next::Error(err) => return Err(err),
        }
    }
}
