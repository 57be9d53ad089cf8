// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stages used only by tests.

use std::cell::RefCell;
use std::rc::Rc;

use crate::config::{Registry, StageDescriptor};
use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult};
use crate::packet::{Edge, Message, Unit};
use crate::traits::Stage;

/// Shared record of what a set of stubs saw, in order.
pub type Journal = Rc<RefCell<Vec<String>>>;

/// Writes `name:payload` for each unit and `!verb` for each message it
/// sees, then forwards.
#[derive(Debug)]
pub struct StubStage {
    journal: Journal,
}

impl StubStage {
    pub fn new(journal: Journal) -> Self {
        Self { journal }
    }
}

impl Stage for StubStage {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        self.journal
            .borrow_mut()
            .push(format!("{}:{}", link.name(), unit.text()));
        link.forward(unit, Edge::Main)
    }

    fn notice_message(&mut self, message: &Message) {
        self.journal.borrow_mut().push(format!("!{}", message.verb()));
    }

    fn close(&mut self, link: &Link) -> EngineResult<()> {
        self.journal.borrow_mut().push(format!("closed {}", link.name()));
        Ok(())
    }
}

/// A stage that always fails.
#[derive(Debug, Default)]
pub struct FailingStage;

impl Stage for FailingStage {
    fn accept(&mut self, _unit: Unit, link: &Link) -> EngineResult<()> {
        Err(DataProcessingError::new(link.name(), "always fails").into())
    }
}

/// Asks the graph to shut down from inside its own `accept`, then forwards.
#[derive(Debug, Default)]
pub struct ShutdownStage;

impl Stage for ShutdownStage {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        link.request_shutdown()?;
        link.forward(unit, Edge::Main)
    }
}

/// Built-ins plus `stub`, `failing` and `shutdown`, all sharing one journal.
pub fn stub_registry() -> (Registry, Journal) {
    let journal = Journal::default();
    let mut registry = Registry::with_builtins();
    let shared = Rc::clone(&journal);
    let descriptors = [
        StageDescriptor::new("stub", "Records what it sees", &[], &[], move || {
            Box::new(StubStage::new(Rc::clone(&shared)))
        }),
        StageDescriptor::new("failing", "Always fails", &[], &[], || Box::new(FailingStage)),
        StageDescriptor::new("shutdown", "Shuts the graph down", &[], &[], || {
            Box::new(ShutdownStage)
        }),
    ];
    for descriptor in descriptors {
        registry
            .register(descriptor)
            .expect("stub types do not clash with built-ins");
    }
    (registry, journal)
}
