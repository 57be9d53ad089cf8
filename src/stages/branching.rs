// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stages that feed a fan-out. Each must be followed by a branch in the
//! route; a branch forward to anything else is a routing error.
//!
//! All of them send to the branch first, then to main.

use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult, StructuralConfigError};
use crate::packet::{Edge, Unit};
use crate::traits::Stage;
use serde_json::Value;
use std::cmp::Ordering;

/// Sends an independent copy down the branch and the original down main.
#[derive(Debug, Default)]
pub struct BranchClone;

impl Stage for BranchClone {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        link.forward(unit.duplicate(), Edge::Branch)?;
        link.forward(unit, Edge::Main)
    }
}

/// Sends the same unit down both edges. Changes made on the branch are
/// visible to main.
#[derive(Debug, Default)]
pub struct BranchRef;

impl Stage for BranchRef {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        link.forward(unit.alias(), Edge::Branch)?;
        link.forward(unit, Edge::Main)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Comparison {
    #[default]
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
}

impl Comparison {
    fn parse(text: &str) -> Option<Self> {
        match text {
            "equals" => Some(Comparison::Equals),
            "not_equals" => Some(Comparison::NotEquals),
            "less_than" => Some(Comparison::LessThan),
            "greater_than" => Some(Comparison::GreaterThan),
            _ => None,
        }
    }
}

/// Numbers compare by value whatever their representation.
fn same(lhs: &Value, rhs: &Value) -> bool {
    match (lhs.as_f64(), rhs.as_f64()) {
        (Some(l), Some(r)) => l == r,
        _ => lhs == rhs,
    }
}

fn order(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Number(_), Value::Number(_)) => lhs.as_f64()?.partial_cmp(&rhs.as_f64()?),
        (Value::String(l), Value::String(r)) => Some(l.cmp(r)),
        (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
        _ => None,
    }
}

/// Branches when a value satisfies a comparison.
///
/// The left-hand side is the unit attribute named by `branch_key`, or with
/// `branch_on_packet: false` the stage's own parameter of that name. It is
/// compared against `compare_value` using `comparison` (`equals`,
/// `not_equals`, `less_than`, `greater_than`). A true result goes to the
/// branch, anything else to main.
#[derive(Debug, Default)]
pub struct BranchIf {
    branch_key: String,
    comparison: Comparison,
    compare_value: Value,
    branch_on_packet: bool,
    params: ParamTable,
}

impl BranchIf {
    fn lhs(&self, unit: &Unit, stage: &str) -> Result<Value, DataProcessingError> {
        let found = if self.branch_on_packet {
            unit.attr(&self.branch_key)
        } else {
            self.params.get(&self.branch_key).cloned()
        };
        found.ok_or_else(|| {
            DataProcessingError::new(
                stage,
                format!("no value for branch_key '{}'", self.branch_key),
            )
        })
    }

    fn holds(&self, lhs: &Value, stage: &str) -> Result<bool, DataProcessingError> {
        let rhs = &self.compare_value;
        match self.comparison {
            Comparison::Equals => Ok(same(lhs, rhs)),
            Comparison::NotEquals => Ok(!same(lhs, rhs)),
            Comparison::LessThan | Comparison::GreaterThan => {
                let ordering = order(lhs, rhs).ok_or_else(|| {
                    DataProcessingError::new(
                        stage,
                        format!("cannot order {} against {}", lhs, rhs),
                    )
                })?;
                Ok(match self.comparison {
                    Comparison::LessThan => ordering == Ordering::Less,
                    _ => ordering == Ordering::Greater,
                })
            }
        }
    }
}

impl Stage for BranchIf {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        let lhs = self.lhs(&unit, link.name())?;
        let edge = if self.holds(&lhs, link.name())? {
            Edge::Branch
        } else {
            Edge::Main
        };
        link.forward(unit, edge)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.branch_key = params.text("branch_key")?;
        let comparison = params.text("comparison")?;
        self.comparison = Comparison::parse(&comparison)
            .ok_or_else(|| params.invalid("comparison", format!("unknown comparison '{}'", comparison)))?;
        self.compare_value = params.value("compare_value")?.clone();
        self.branch_on_packet = params.flag("branch_on_packet")?;
        self.params = params.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch_if(comparison: &str, compare_value: impl Into<Value>) -> BranchIf {
        let mut stage = BranchIf::default();
        stage
            .configure(
                &ParamTable::new("branch_if", "branch_if")
                    .with("branch_key", "n")
                    .with("comparison", comparison)
                    .with("compare_value", compare_value)
                    .with("branch_on_packet", true),
            )
            .unwrap();
        stage
    }

    #[test]
    fn test_comparisons() {
        let unit = Unit::new().with_attr("n", 3);
        let lhs = branch_if("equals", 3).lhs(&unit, "b").unwrap();

        assert!(branch_if("equals", 3.0).holds(&lhs, "b").unwrap());
        assert!(branch_if("not_equals", 4).holds(&lhs, "b").unwrap());
        assert!(branch_if("less_than", 10).holds(&lhs, "b").unwrap());
        assert!(!branch_if("greater_than", 10).holds(&lhs, "b").unwrap());
    }

    #[test]
    fn test_unordered_values_fail() {
        let stage = branch_if("less_than", "text");
        assert!(stage.holds(&Value::from(1), "b").is_err());
    }

    #[test]
    fn test_missing_attribute_fails() {
        let stage = branch_if("equals", true);
        assert!(stage.lhs(&Unit::new(), "b").is_err());
    }

    #[test]
    fn test_unknown_comparison_is_structural() {
        let mut stage = BranchIf::default();
        let err = stage
            .configure(
                &ParamTable::new("branch_if", "branch_if")
                    .with("branch_key", "n")
                    .with("comparison", "roughly")
                    .with("compare_value", 1)
                    .with("branch_on_packet", true),
            )
            .unwrap_err();
        assert!(matches!(err, StructuralConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_branch_on_own_parameter() {
        let mut stage = BranchIf::default();
        stage
            .configure(
                &ParamTable::new("branch_if", "branch_if")
                    .with("branch_key", "compare_value")
                    .with("comparison", "equals")
                    .with("compare_value", true)
                    .with("branch_on_packet", false),
            )
            .unwrap();
        let lhs = stage.lhs(&Unit::new(), "b").unwrap();
        assert!(stage.holds(&lhs, "b").unwrap());
    }
}
