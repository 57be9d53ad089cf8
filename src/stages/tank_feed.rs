// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::engine::tank::TankHandle;
use crate::engine::Link;
use crate::errors::{EngineResult, RoutingError};
use crate::packet::Unit;
use crate::traits::{Stage, Successor};

/// Closes a feedback loop by pushing units straight into the buffer of the
/// `tank_queue` that follows it, instead of calling that stage.
#[derive(Debug, Default)]
pub struct TankFeed {
    tank: Option<TankHandle>,
}

impl Stage for TankFeed {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        match &self.tank {
            Some(tank) => {
                tank.push(unit);
                Ok(())
            }
            None => Err(RoutingError::FeederWithoutBuffer {
                stage: link.name().to_string(),
                successor: None,
            }
            .into()),
        }
    }

    fn attach(&mut self, stage: &str, successor: Option<&Successor>) -> Result<(), RoutingError> {
        match successor {
            Some(Successor {
                tank: Some(tank), ..
            }) => {
                self.tank = Some(tank.clone());
                Ok(())
            }
            _ => Err(RoutingError::FeederWithoutBuffer {
                stage: stage.to_string(),
                successor: successor.map(|s| format!("'{}' ({})", s.name, s.type_name)),
            }),
        }
    }

    fn feeds_back(&self) -> bool {
        true
    }
}
