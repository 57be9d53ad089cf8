// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::Link;
use crate::errors::EngineResult;
use crate::packet::{Edge, Unit};
use crate::traits::Stage;

/// Forwards every unit unchanged.
#[derive(Debug, Default)]
pub struct PassThrough;

impl Stage for PassThrough {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        link.forward(unit, Edge::Main)
    }
}

/// Discards every unit. Useful at the end of a main path whose output is
/// not wanted once a branch has taken what it needs.
#[derive(Debug, Default)]
pub struct Waste {
    discarded: usize,
}

impl Waste {
    pub fn discarded(&self) -> usize {
        self.discarded
    }
}

impl Stage for Waste {
    fn accept(&mut self, _unit: Unit, _link: &Link) -> EngineResult<()> {
        self.discarded += 1;
        Ok(())
    }
}
