// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::graph::{Graph, NodeId};
use crate::config::params::Environment;
use crate::errors::{EngineResult, RoutingError};
use crate::observability::messages::stage::UnitForwarded;
use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Message, Packet, Unit};

/// A stage's view of the graph during a call: its own identity and the
/// means to hand units and messages to its successor.
pub struct Link<'g> {
    graph: &'g Graph,
    node: NodeId,
}

impl<'g> Link<'g> {
    pub(crate) fn new(graph: &'g Graph, node: NodeId) -> Self {
        Self { graph, node }
    }

    /// The stage's dotted path (its plain name at the top level).
    pub fn name(&self) -> &str {
        &self.graph.node(self.node).path
    }

    pub fn type_name(&self) -> &str {
        &self.graph.node(self.node).type_name
    }

    /// Hands `unit` to the successor, tagged for `edge`.
    ///
    /// Without a successor this is a no-op, unless a branch was requested.
    /// A branch requires the successor to be a fan-out node.
    pub fn forward(&self, unit: Unit, edge: Edge) -> EngineResult<()> {
        let node = self.graph.node(self.node);
        let successor = node.main.get();
        let fans_out = successor.map_or(false, |id| self.graph.is_fan_out(id));
        if edge == Edge::Branch && !fans_out {
            return Err(RoutingError::NoFanOut {
                stage: node.path.clone(),
            }
            .into());
        }
        let Some(successor) = successor else {
            return Ok(());
        };

        unit.set_fork(edge);
        unit.set_origin(&node.name);
        UnitForwarded {
            from: &node.path,
            to: &self.graph.node(successor).path,
            edge,
        }
        .log();
        self.graph.deliver(successor, Packet::Unit(unit))
    }

    pub fn forward_message(&self, message: Message) -> EngineResult<()> {
        match self.graph.node(self.node).main.get() {
            Some(successor) => self.graph.deliver(successor, Packet::Message(message)),
            None => Ok(()),
        }
    }

    pub fn shutting_down(&self) -> bool {
        self.graph.is_shutting_down()
    }

    /// Starts graph shutdown from inside processing. The calling stage
    /// closes once its active call returns.
    pub fn request_shutdown(&self) -> EngineResult<()> {
        self.graph.shutdown()
    }

    pub fn environment(&self) -> &Environment {
        self.graph.environment()
    }
}
