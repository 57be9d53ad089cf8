// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::time::Instant;

use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult};
use crate::observability::messages::stage::{
    StageFailed, UnitProcessingCompleted, UnitProcessingStarted,
};
use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Unit};
use crate::traits::Stage;

/// Reverse String stage - reverses the unit's text payload
#[derive(Debug, Default)]
pub struct ReverseString;

impl ReverseString {
    pub fn new() -> Self {
        Self
    }
}

impl Stage for ReverseString {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        let data = unit.data();
        let start_msg = UnitProcessingStarted {
            stage: link.name(),
            input_size: data.len(),
        };

        let span = start_msg.span("unit_processing");
        let _guard = span.enter();
        start_msg.log();

        let start_time = Instant::now();

        let input = match String::from_utf8(data) {
            Ok(text) => text,
            Err(e) => {
                let error =
                    DataProcessingError::new(link.name(), format!("Invalid UTF-8 input: {}", e));
                StageFailed {
                    stage: link.name(),
                    error: &error,
                }
                .log();
                return Err(error.into());
            }
        };

        let reversed: String = input.chars().rev().collect();
        let output_size = reversed.len();
        unit.set_data(reversed);

        UnitProcessingCompleted {
            stage: link.name(),
            input_size: start_msg.input_size,
            output_size,
            duration: start_time.elapsed(),
        }
        .log();

        link.forward(unit, Edge::Main)
    }
}
