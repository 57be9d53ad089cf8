// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::ParamTable;
use crate::engine::tank::TankHandle;
use crate::engine::Link;
use crate::errors::{EngineResult, StructuralConfigError};
use crate::observability::messages::tank::{TankForwarded, TankResized};
use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Unit};
use crate::traits::Stage;

/// A bounded priority buffer.
///
/// Units are held until more than `tank_size` are present, then the one with
/// the lowest `priority_field_name` value is forwarded. The tank starts full
/// of placeholders, so the first `tank_size` arrivals are held back.
/// Placeholders are dropped when they leave. A negative size holds
/// everything until close.
///
/// A `tank_feed` upstream in a loop pushes straight into this buffer; the
/// drain loop in [`TankQueue::accept`] then picks the unit up once the
/// forward that produced it has returned. That is what keeps recursive
/// graphs flat.
#[derive(Debug, Default)]
pub struct TankQueue {
    tank: TankHandle,
    forwarded: u64,
}

impl TankQueue {
    pub fn held(&self) -> usize {
        self.tank.held()
    }

    /// Units and placeholders together.
    pub fn len(&self) -> usize {
        self.tank.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tank.is_empty()
    }

    pub fn all_data(&self) -> Vec<Vec<u8>> {
        self.tank.sorted_data()
    }

    /// Units forwarded since the graph was built.
    pub fn forwarded(&self) -> u64 {
        self.forwarded
    }

    fn drain(&mut self, link: &Link) -> EngineResult<()> {
        while let Some(slot) = self.tank.pop_excess() {
            let Some(unit) = slot else {
                continue;
            };
            self.forwarded += 1;
            TankForwarded {
                stage: link.name(),
                cycle: self.forwarded,
            }
            .log();
            link.forward(unit, Edge::Main)?;
        }
        Ok(())
    }
}

impl Stage for TankQueue {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        self.tank.push(unit);
        self.drain(link)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.tank.set_capacity(params.int("tank_size")?);
        self.tank.set_priority_field(&params.text("priority_field_name")?);
        self.tank.pad();
        Ok(())
    }

    fn reconfigure(&mut self, params: &ParamTable, _changed: &[String], link: &Link) -> EngineResult<()> {
        self.tank.set_capacity(params.int("tank_size")?);
        self.tank.set_priority_field(&params.text("priority_field_name")?);
        self.drain(link)?;
        self.tank.pad();
        TankResized {
            stage: link.name(),
            capacity: self.tank.capacity(),
            held: self.tank.held(),
            len: self.tank.len(),
        }
        .log();
        Ok(())
    }

    fn flush_buffer(&mut self, link: &Link) -> EngineResult<()> {
        self.tank.set_capacity(0);
        self.drain(link)
    }

    fn tank(&self) -> Option<TankHandle> {
        Some(self.tank.clone())
    }
}
