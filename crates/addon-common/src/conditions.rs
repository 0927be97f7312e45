//! Structural comparison of condition sets
//!
//! Conditions are keyed by type. Two sets are equal when they hold the same
//! `(type, status, reason)` triples, regardless of order. Transition
//! timestamps and messages never take part in the comparison.

use std::collections::HashMap;

use crate::crd::{AddonStatusCondition, Condition, ConditionStatus};

/// Anything that can be compared as a `(type, status, reason)` triple
pub trait StatusTriple {
    /// Condition type, the key of the set
    fn condition_type(&self) -> &str;
    /// Condition status
    fn condition_status(&self) -> &ConditionStatus;
    /// Machine-readable reason
    fn condition_reason(&self) -> &str;
}

impl StatusTriple for Condition {
    fn condition_type(&self) -> &str {
        &self.type_
    }

    fn condition_status(&self) -> &ConditionStatus {
        &self.status
    }

    fn condition_reason(&self) -> &str {
        &self.reason
    }
}

impl StatusTriple for AddonStatusCondition {
    fn condition_type(&self) -> &str {
        &self.status_type
    }

    fn condition_status(&self) -> &ConditionStatus {
        &self.status_value
    }

    fn condition_reason(&self) -> &str {
        &self.reason
    }
}

fn index<T: StatusTriple>(conditions: &[T]) -> HashMap<&str, (&ConditionStatus, &str)> {
    conditions
        .iter()
        .map(|c| {
            (
                c.condition_type(),
                (c.condition_status(), c.condition_reason()),
            )
        })
        .collect()
}

/// Compare two condition sets, ignoring order and timestamps
///
/// Duplicate types within one side are not supported; callers keep at most
/// one condition per type.
pub fn conditions_equal<A, B>(a: &[A], b: &[B]) -> bool
where
    A: StatusTriple,
    B: StatusTriple,
{
    a.len() == b.len() && index(a) == index(b)
}
