// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::SEQ_NUM_FIELD;
use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{EngineResult, MessageError, StructuralConfigError};
use crate::packet::{Edge, Message, Unit};
use crate::traits::Stage;

pub const RESET_COUNTER_VERB: &str = "reset_counter";

/// Numbers units in arrival order.
///
/// Writes the counter to `seq_packet_field_name` unless the unit already
/// carries a non-negative number there. The counter starts at `start` and
/// goes back to it on a `reset_counter` message.
#[derive(Debug, Default)]
pub struct SeqPacket {
    field: String,
    start: i64,
    counter: i64,
}

impl SeqPacket {
    pub fn counter(&self) -> i64 {
        self.counter
    }

    fn current(&self, unit: &Unit) -> Option<i64> {
        if self.field == SEQ_NUM_FIELD {
            unit.seq_num()
        } else {
            unit.attr(&self.field).and_then(|v| v.as_i64())
        }
    }

    fn number(&mut self, unit: &Unit) {
        if self.current(unit).map_or(true, |n| n < 0) {
            if self.field == SEQ_NUM_FIELD {
                unit.set_seq_num(self.counter);
            } else {
                unit.set_attr(&self.field, self.counter);
            }
        }
        self.counter += 1;
    }
}

impl Stage for SeqPacket {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        self.number(&unit);
        link.forward(unit, Edge::Main)
    }

    fn on_message(&mut self, message: &Message, link: &Link) -> EngineResult<()> {
        if message.verb() == RESET_COUNTER_VERB {
            self.counter = self.start;
            return Ok(());
        }
        Err(MessageError::Unrecognised {
            stage: link.name().to_string(),
            verb: message.verb().to_string(),
        }
        .into())
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.field = params.text("seq_packet_field_name")?;
        self.start = params.int("start")?;
        self.counter = self.start;
        Ok(())
    }

    fn reconfigure(&mut self, params: &ParamTable, changed: &[String], _link: &Link) -> EngineResult<()> {
        self.field = params.text("seq_packet_field_name")?;
        self.start = params.int("start")?;
        if changed.iter().any(|c| c == "start") {
            self.counter = self.start;
        }
        Ok(())
    }
}
