// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult};
use crate::packet::{Edge, Unit};
use crate::traits::Stage;

const X: &str = "x";
const PENDING: &str = "pending";
const RECURSE: &str = "recurse";
const RESULT: &str = "x_factorial";

/// One step of an iterative factorial carried on the unit's attributes.
///
/// While `x` is above one the step multiplies it into `pending`, decrements
/// it and sets `recurse`. At one or zero it writes `x_factorial` and clears
/// `recurse`. Negative `x` is rejected. Paired with `branch_if:recurse` and a tank feedback loop this
/// computes `x!` without growing the call stack.
#[derive(Debug, Default)]
pub struct FactorialCalc;

fn integer_attr(unit: &Unit, key: &str, stage: &str) -> Result<Option<i64>, DataProcessingError> {
    match unit.attr(key) {
        None => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            DataProcessingError::new(stage, format!("attribute '{}' is not an integer: {}", key, value))
        }),
    }
}

impl Stage for FactorialCalc {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        let x = integer_attr(&unit, X, link.name())?
            .ok_or_else(|| DataProcessingError::new(link.name(), "unit has no 'x' attribute"))?;
        if x < 0 {
            return Err(DataProcessingError::new(
                link.name(),
                format!("cannot take the factorial of {}", x),
            )
            .into());
        }
        let pending = integer_attr(&unit, PENDING, link.name())?;

        if x <= 1 {
            unit.set_attr(RESULT, pending.unwrap_or(1));
            unit.set_attr(RECURSE, false);
        } else {
            let product = pending.unwrap_or(1).checked_mul(x).ok_or_else(|| {
                DataProcessingError::new(link.name(), format!("factorial overflows at x = {}", x))
            })?;
            unit.set_attr(PENDING, product);
            unit.set_attr(X, x - 1);
            unit.set_attr(RECURSE, true);
        }
        link.forward(unit, Edge::Main)
    }
}
