// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{EngineResult, StructuralConfigError};
use crate::packet::{Edge, Message, Unit};
use crate::traits::Stage;
use std::collections::VecDeque;

/// Keeps the units it receives, then forwards them.
///
/// `max_results` bounds how many are kept; the oldest is dropped first.
/// Zero keeps everything. With `capture_msgs` the sink also records every
/// control message that passes through it.
#[derive(Debug, Default)]
pub struct Sink {
    results: VecDeque<Unit>,
    messages: Vec<Message>,
    max_results: usize,
    capture_msgs: bool,
}

impl Sink {
    pub fn results(&self) -> impl Iterator<Item = &Unit> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn last(&self) -> Option<&Unit> {
        self.results.back()
    }

    /// Payloads of the kept units, oldest first.
    pub fn all_data(&self) -> Vec<Vec<u8>> {
        self.results.iter().map(Unit::data).collect()
    }

    pub fn all_text(&self) -> Vec<String> {
        self.results.iter().map(Unit::text).collect()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Empties the sink, returning what it held.
    pub fn take_results(&mut self) -> Vec<Unit> {
        self.results.drain(..).collect()
    }

    fn keep(&mut self, unit: Unit) {
        self.results.push_back(unit);
        if self.max_results > 0 && self.results.len() > self.max_results {
            self.results.pop_front();
        }
    }
}

impl Stage for Sink {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        self.keep(unit.alias());
        link.forward(unit, Edge::Main)
    }

    fn notice_message(&mut self, message: &Message) {
        if self.capture_msgs {
            self.messages.push(message.clone());
        }
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        let max_results = params.int("max_results")?;
        self.max_results = usize::try_from(max_results)
            .map_err(|_| params.invalid("max_results", "must not be negative"))?;
        self.capture_msgs = params.flag("capture_msgs")?;
        while self.max_results > 0 && self.results.len() > self.max_results {
            self.results.pop_front();
        }
        Ok(())
    }
}
