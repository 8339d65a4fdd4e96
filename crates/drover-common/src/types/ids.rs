//! Identifier types for Drover.
//!
//! These types provide type-safe wrappers around identifiers, preventing
//! a stage id from being passed where a job id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an operator: a scope name plus a sequence number.
///
/// Keys are unique within a scope. A script compiled once yields one scope,
/// so every operator it produces, nested sub-plans included, has a distinct key.
///
/// # Example
///
/// ```rust
/// use drover_common::types::OperatorKey;
///
/// let key = OperatorKey::new("scope", 12);
/// assert_eq!(key.to_string(), "scope-12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OperatorKey {
    /// Scope the id is unique in.
    pub scope: String,
    /// Sequence number within the scope.
    pub id: u64,
}

impl OperatorKey {
    /// Creates a new operator key.
    #[must_use]
    pub fn new(scope: impl Into<String>, id: u64) -> Self {
        Self {
            scope: scope.into(),
            id,
        }
    }
}

impl fmt::Display for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.scope, self.id)
    }
}

/// Hands out sequential operator keys within one scope.
#[derive(Debug, Clone)]
pub struct KeyGenerator {
    scope: String,
    next: u64,
}

impl KeyGenerator {
    /// Creates a generator whose first key has id 1.
    #[must_use]
    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            next: 1,
        }
    }

    /// Returns the scope name.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// Returns a fresh key.
    pub fn next_key(&mut self) -> OperatorKey {
        let key = OperatorKey::new(self.scope.clone(), self.next);
        self.next += 1;
        key
    }
}

/// Stage identifier - a unit of the execution DAG.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct StageId(u32);

impl StageId {
    /// Creates a new `StageId` from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the position of this stage in a dense stage table.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stage-{}", self.0)
    }
}

/// Job identifier - a backend job bound to one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct JobId(u64);

impl JobId {
    /// Creates a new `JobId` from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}
