// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::ParamTable;
use crate::engine::tank::TankHandle;
use crate::engine::Link;
use crate::errors::{EngineResult, MessageError, RoutingError, StructuralConfigError};
use crate::packet::{Message, Unit};
use std::any::Any;

/// Downcasting support so drivers and tests can inspect concrete stages.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// What a stage is told about its main successor once the graph is connected.
pub struct Successor<'a> {
    pub name: &'a str,
    pub type_name: &'a str,
    /// Present when the successor is a tank queue.
    pub tank: Option<TankHandle>,
}

/// A processing stage.
///
/// Stages are constructed once per graph build, bound, then initialised with
/// [`Stage::configure`]. During processing they hand units onward through the
/// [`Link`] they are given; they never hold references to other stages.
///
/// Delivery of a unit runs `before_accept`, `accept` and `after_accept` in
/// that order, after any environment-sourced parameters have been refreshed.
/// Closing runs `flush_buffer` then `close`.
pub trait Stage: AsAny {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()>;

    fn before_accept(&mut self, _unit: &mut Unit, _link: &Link) -> EngineResult<()> {
        Ok(())
    }

    fn after_accept(&mut self, _link: &Link) -> EngineResult<()> {
        Ok(())
    }

    /// Sees every message that reaches this stage, addressed to it or not.
    fn notice_message(&mut self, _message: &Message) {}

    /// Stage-specific verbs. `reset` never reaches here; the engine handles it.
    fn on_message(&mut self, message: &Message, link: &Link) -> EngineResult<()> {
        Err(MessageError::Unrecognised {
            stage: link.name().to_string(),
            verb: message.verb().to_string(),
        }
        .into())
    }

    /// Initialise from the bound parameter table. Failures are structural.
    fn configure(&mut self, _params: &ParamTable) -> Result<(), StructuralConfigError> {
        Ok(())
    }

    /// Called after a reset message or a dynamic refresh changed `changed`.
    fn reconfigure(
        &mut self,
        params: &ParamTable,
        _changed: &[String],
        _link: &Link,
    ) -> EngineResult<()> {
        self.configure(params).map_err(Into::into)
    }

    fn flush_buffer(&mut self, _link: &Link) -> EngineResult<()> {
        Ok(())
    }

    fn close(&mut self, _link: &Link) -> EngineResult<()> {
        Ok(())
    }

    /// `stage` is this stage's own path in the graph.
    fn attach(&mut self, _stage: &str, _successor: Option<&Successor>) -> Result<(), RoutingError> {
        Ok(())
    }

    fn tank(&self) -> Option<TankHandle> {
        None
    }

    /// True for a stage whose successor is the back edge of a loop. Messages
    /// and closing are not propagated past it.
    fn feeds_back(&self) -> bool {
        false
    }
}
