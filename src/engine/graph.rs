// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The live stage graph.
//!
//! Nodes live in an arena and refer to their successors by index. Each stage
//! sits in its own `RefCell`; a unit's whole traversal happens synchronously
//! inside the root [`Graph::send`], and a stage whose call is still active is
//! detected with `try_borrow_mut` rather than re-entered.

use super::link::Link;
use crate::config::consts::{PUMP_SINK_NAME, RESET_VERB};
use crate::config::literal::value_to_text;
use crate::config::params::{Environment, ParamSet, ParamTable};
use crate::errors::{
    DataProcessingError, EngineResult, MessageError, ReentrancyError, RoutingError,
    StructuralConfigError,
};
use crate::observability::messages::engine::{ShutdownCompleted, ShutdownStarted};
use crate::observability::messages::stage::{
    CloseDeferred, DynamicParameterRefreshed, FanOutRouted, MessageOpened, ParameterReset,
    ReentrancySuppressed, StageClosed,
};
use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Message, Packet, Unit};
use crate::stages::sink::Sink;
use crate::traits::Stage;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::time::Instant;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageState {
    Running,
    Flushing,
    Closing,
    Closed,
}

pub(crate) enum NodeKind {
    Stage(RefCell<Box<dyn Stage>>),
    FanOut,
    SubGraph {
        entry: Cell<Option<NodeId>>,
        exit: Cell<Option<NodeId>>,
    },
}

pub(crate) struct Node {
    pub name: String,
    pub path: String,
    pub type_name: String,
    pub kind: NodeKind,
    pub main: Cell<Option<NodeId>>,
    pub branch: Cell<Option<NodeId>>,
    pub declared: ParamSet,
    pub params: RefCell<ParamTable>,
    /// (parameter, environment variable) pairs refreshed before every unit.
    pub dynamic: Vec<(String, String)>,
    pub state: Cell<StageState>,
    pub deferred_close: Cell<bool>,
}

impl Node {
    pub(crate) fn new(name: &str, path: &str, type_name: &str, kind: NodeKind) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            type_name: type_name.to_string(),
            kind,
            main: Cell::new(None),
            branch: Cell::new(None),
            declared: ParamSet::new(),
            params: RefCell::new(ParamTable::new(path, type_name)),
            dynamic: Vec::new(),
            state: Cell::new(StageState::Running),
            deferred_close: Cell::new(false),
        }
    }

    fn matches(&self, destination: &str) -> bool {
        destination == self.name || destination == self.path || destination == self.type_name
    }
}

/// A fully linked, parameter-bound stage graph.
///
/// Built by [`crate::engine::GraphBuilder`]. The graph is deliberately
/// `!Send`: all of its state lives behind `Cell`/`RefCell` on one thread.
///
/// # Example
/// ```
/// use the_filterworks::config::{parse_pipeline_config, ConfigFormat, Registry};
/// use the_filterworks::engine::GraphBuilder;
/// use the_filterworks::packet::Unit;
///
/// let config = parse_pipeline_config(
///     "main: {type: demo, description: Reverse text}\nroute: reverse_string",
///     ConfigFormat::Yaml,
/// )
/// .unwrap();
/// let registry = Registry::with_builtins();
/// let mut graph = GraphBuilder::new(&config, &registry).build().unwrap();
///
/// let results = graph.pump_data(vec![Unit::from_text("abc")]).unwrap();
/// assert_eq!(results[0].text(), "cba");
/// graph.shutdown().unwrap();
/// ```
pub struct Graph {
    nodes: Vec<Node>,
    root: NodeId,
    pump_sink: NodeId,
    environment: Environment,
    shutting_down: Cell<bool>,
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("nodes", &self.node_names())
            .field("shutting_down", &self.shutting_down.get())
            .finish_non_exhaustive()
    }
}

impl Graph {
    pub(crate) fn from_parts(
        mut nodes: Vec<Node>,
        root: NodeId,
        environment: Environment,
    ) -> Result<Self, StructuralConfigError> {
        let mut sink = Sink::default();
        let params = ParamTable::new(PUMP_SINK_NAME, "sink")
            .with("max_results", 0)
            .with("capture_msgs", false);
        sink.configure(&params)?;

        let pump_sink = nodes.len();
        let mut node = Node::new(
            PUMP_SINK_NAME,
            PUMP_SINK_NAME,
            "sink",
            NodeKind::Stage(RefCell::new(Box::new(sink))),
        );
        node.params = RefCell::new(params);
        nodes.push(node);

        Ok(Self {
            nodes,
            root,
            pump_sink,
            environment,
            shutting_down: Cell::new(false),
        })
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub(crate) fn is_fan_out(&self, id: NodeId) -> bool {
        matches!(self.nodes[id].kind, NodeKind::FanOut)
    }

    fn find(&self, path: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(id, n)| *id != self.pump_sink && n.path == path)
            .map(|(id, _)| id)
    }

    fn find_or_err(&self, path: &str) -> Result<NodeId, StructuralConfigError> {
        self.find(path)
            .ok_or_else(|| StructuralConfigError::UnknownStage {
                path: path.to_string(),
            })
    }

    /// Sets `from`'s main successor. A sub-graph also links its exit onward.
    pub(crate) fn link_main(nodes: &[Node], from: NodeId, to: Option<NodeId>) {
        nodes[from].main.set(to);
        if let NodeKind::SubGraph { exit, .. } = &nodes[from].kind {
            if let Some(exit) = exit.get() {
                Self::link_main(nodes, exit, to);
            }
        }
    }

    pub fn send(&self, unit: Unit) -> EngineResult<()> {
        self.deliver(self.root, Packet::Unit(unit))
    }

    pub fn send_message(&self, message: Message) -> EngineResult<()> {
        self.deliver(self.root, Packet::Message(message))
    }

    /// Sends every unit and returns whatever came out of the exit node.
    pub fn pump_data(&mut self, units: Vec<Unit>) -> EngineResult<Vec<Unit>> {
        let Some(exit) = self.exit() else {
            return Ok(Vec::new());
        };
        let previous = self.nodes[exit].main.get();
        Self::link_main(&self.nodes, exit, Some(self.pump_sink));

        let result = units.into_iter().try_for_each(|unit| self.send(unit));
        Self::link_main(&self.nodes, exit, previous);
        result?;

        let NodeKind::Stage(cell) = &self.nodes[self.pump_sink].kind else {
            return Ok(Vec::new());
        };
        let mut stage = cell.try_borrow_mut().map_err(|_| ReentrancyError {
            stage: PUMP_SINK_NAME.to_string(),
        })?;
        let stage: &mut dyn Stage = &mut **stage;
        Ok(stage
            .as_any_mut()
            .downcast_mut::<Sink>()
            .map(Sink::take_results)
            .unwrap_or_default())
    }

    /// Closes every stage, entry first. Calling it twice is a no-op.
    pub fn shutdown(&self) -> EngineResult<()> {
        if self.shutting_down.replace(true) {
            return Ok(());
        }
        let root = &self.nodes[self.root];
        ShutdownStarted {
            pipeline: &root.type_name,
        }
        .log();
        let started = Instant::now();
        self.close_node(self.root)?;
        ShutdownCompleted {
            pipeline: &root.type_name,
            duration: started.elapsed(),
        }
        .log();
        Ok(())
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.get()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Runs `f` against the stage at `path`, downcast to `T`.
    pub fn inspect<T: Stage + 'static, R>(&self, path: &str, f: impl FnOnce(&T) -> R) -> EngineResult<R> {
        let id = self.find_or_err(path)?;
        let node = &self.nodes[id];
        let NodeKind::Stage(cell) = &node.kind else {
            return Err(StructuralConfigError::UnknownStage {
                path: path.to_string(),
            }
            .into());
        };
        let stage = cell.try_borrow().map_err(|_| ReentrancyError {
            stage: node.path.clone(),
        })?;
        let stage: &dyn Stage = &**stage;
        match stage.as_any().downcast_ref::<T>() {
            Some(stage) => Ok(f(stage)),
            None => Err(StructuralConfigError::InvalidValue {
                stage: node.path.clone(),
                parameter: "type".to_string(),
                reason: format!(
                    "stage is a '{}', not a {}",
                    node.type_name,
                    std::any::type_name::<T>()
                ),
            }
            .into()),
        }
    }

    pub fn param(&self, path: &str, key: &str) -> Option<Value> {
        let id = self.find(path)?;
        let value = self.nodes[id].params.borrow().get(key).cloned();
        value
    }

    pub fn state(&self, path: &str) -> Option<StageState> {
        self.find(path).map(|id| self.nodes[id].state.get())
    }

    pub fn entry_name(&self) -> Option<String> {
        match &self.nodes[self.root].kind {
            NodeKind::SubGraph { entry, .. } => entry.get().map(|id| self.nodes[id].path.clone()),
            _ => None,
        }
    }

    pub fn exit_name(&self) -> Option<String> {
        self.exit().map(|id| self.nodes[id].path.clone())
    }

    fn exit(&self) -> Option<NodeId> {
        match &self.nodes[self.root].kind {
            NodeKind::SubGraph { exit, .. } => exit.get(),
            _ => None,
        }
    }

    /// Paths of every node, fan-outs and sub-graph members included.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(id, _)| *id != self.root && *id != self.pump_sink)
            .map(|(_, n)| n.path.clone())
            .collect()
    }

    pub(crate) fn deliver(&self, id: NodeId, packet: Packet) -> EngineResult<()> {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::SubGraph { entry, .. } => match entry.get() {
                Some(entry) => self.deliver(entry, packet),
                None => Ok(()),
            },
            NodeKind::FanOut => self.route_fan_out(id, packet),
            NodeKind::Stage(cell) => self.deliver_to_stage(id, cell, packet),
        }
    }

    fn route_fan_out(&self, id: NodeId, packet: Packet) -> EngineResult<()> {
        let node = &self.nodes[id];
        match packet {
            Packet::Unit(unit) => {
                let edge = unit.take_fork();
                FanOutRouted {
                    fan_out: &node.path,
                    edge,
                }
                .log();
                match edge {
                    Edge::Branch => match node.branch.get() {
                        Some(branch) => self.deliver(branch, Packet::Unit(unit)),
                        None => Err(RoutingError::MissingBranch {
                            stage: node.path.clone(),
                        }
                        .into()),
                    },
                    Edge::Main => self.deliver_to(node.main.get(), Packet::Unit(unit)),
                }
            }
            Packet::Message(message) => {
                if let Some(branch) = node.branch.get() {
                    self.deliver(branch, Packet::Message(message.clone()))?;
                }
                self.deliver_to(node.main.get(), Packet::Message(message))
            }
        }
    }

    fn deliver_to(&self, target: Option<NodeId>, packet: Packet) -> EngineResult<()> {
        match target {
            Some(target) => self.deliver(target, packet),
            None => Ok(()),
        }
    }

    fn deliver_to_stage(
        &self,
        id: NodeId,
        cell: &RefCell<Box<dyn Stage>>,
        packet: Packet,
    ) -> EngineResult<()> {
        let node = &self.nodes[id];
        if node.state.get() == StageState::Closed {
            return Err(RoutingError::StageClosed {
                stage: node.path.clone(),
            }
            .into());
        }
        let mut stage = match cell.try_borrow_mut() {
            Ok(stage) => stage,
            Err(_) if self.shutting_down.get() => {
                ReentrancySuppressed { stage: &node.path }.log();
                return Ok(());
            }
            Err(_) => {
                return Err(ReentrancyError {
                    stage: node.path.clone(),
                }
                .into())
            }
        };

        let link = Link::new(self, id);
        let result = match packet {
            Packet::Unit(unit) => {
                let accepted = self.accept_unit(node, &mut **stage, unit, &link);
                drop(stage);
                accepted
            }
            Packet::Message(message) => {
                stage.notice_message(&message);
                let consumed = self.open_message(node, &mut **stage, &message, &link);
                let feeds_back = stage.feeds_back();
                drop(stage);
                match consumed {
                    Ok(true) => Ok(()),
                    Ok(false) if feeds_back => Ok(()),
                    Ok(false) => self.deliver_to(node.main.get(), Packet::Message(message)),
                    Err(e) => Err(e),
                }
            }
        };

        if node.deferred_close.replace(false) {
            return result.and(self.close_node(id));
        }
        result
    }

    fn accept_unit(
        &self,
        node: &Node,
        stage: &mut dyn Stage,
        mut unit: Unit,
        link: &Link,
    ) -> EngineResult<()> {
        self.refresh_dynamic(node, stage, link)?;
        stage.before_accept(&mut unit, link)?;
        stage.accept(unit, link)?;
        stage.after_accept(link)
    }

    fn refresh_dynamic(&self, node: &Node, stage: &mut dyn Stage, link: &Link) -> EngineResult<()> {
        if node.dynamic.is_empty() {
            return Ok(());
        }
        let mut changed = Vec::new();
        for (parameter, variable) in &node.dynamic {
            let value = self.environment.resolve(variable).ok_or_else(|| {
                DataProcessingError::new(
                    &node.path,
                    format!(
                        "environment variable '{}' for parameter '{}' is not set",
                        variable, parameter
                    ),
                )
            })?;
            if node.params.borrow_mut().set(parameter, value) {
                DynamicParameterRefreshed {
                    stage: &node.path,
                    parameter,
                    variable,
                }
                .log();
                changed.push(parameter.clone());
            }
        }
        if changed.is_empty() {
            return Ok(());
        }
        let params = node.params.borrow().clone();
        stage.reconfigure(&params, &changed, link)
    }

    /// Opens `message` if it is addressed to this stage. Returns true when
    /// the message was consumed and must not travel further.
    fn open_message(
        &self,
        node: &Node,
        stage: &mut dyn Stage,
        message: &Message,
        link: &Link,
    ) -> EngineResult<bool> {
        if !node.matches(message.destination()) {
            return Ok(false);
        }
        MessageOpened {
            stage: &node.path,
            message,
        }
        .log();
        if message.verb() == RESET_VERB {
            self.reset_parameter(node, stage, message, link)?;
        } else {
            stage.on_message(message, link)?;
        }
        Ok(message.single_use())
    }

    fn reset_parameter(
        &self,
        node: &Node,
        stage: &mut dyn Stage,
        message: &Message,
        link: &Link,
    ) -> EngineResult<()> {
        let [parameter, value] = message.values() else {
            return Err(MessageError::Malformed {
                stage: node.path.clone(),
                verb: message.verb().to_string(),
                reason: format!("expected 2 values, found {}", message.values().len()),
            }
            .into());
        };
        let parameter = value_to_text(parameter);
        if !node.declared.contains(&parameter) {
            return Err(MessageError::UnknownParameter {
                stage: node.path.clone(),
                parameter,
            }
            .into());
        }
        node.params.borrow_mut().set(&parameter, value.clone());
        ParameterReset {
            stage: &node.path,
            parameter: &parameter,
            value,
        }
        .log();
        let params = node.params.borrow().clone();
        stage.reconfigure(&params, &[parameter], link)
    }

    pub(crate) fn close_node(&self, id: NodeId) -> EngineResult<()> {
        let node = &self.nodes[id];
        match &node.kind {
            NodeKind::FanOut => {
                if node.state.replace(StageState::Closed) == StageState::Closed {
                    return Ok(());
                }
                self.close_optional(node.branch.get())?;
                self.close_optional(node.main.get())
            }
            NodeKind::SubGraph { entry, .. } => {
                if node.state.replace(StageState::Closed) == StageState::Closed {
                    return Ok(());
                }
                self.close_optional(entry.get())
            }
            NodeKind::Stage(cell) => {
                if node.state.get() != StageState::Running {
                    return Ok(());
                }
                let Ok(mut stage) = cell.try_borrow_mut() else {
                    node.deferred_close.set(true);
                    CloseDeferred { stage: &node.path }.log();
                    return Ok(());
                };
                let link = Link::new(self, id);
                node.state.set(StageState::Flushing);
                stage.flush_buffer(&link)?;
                node.state.set(StageState::Closing);
                stage.close(&link)?;
                node.state.set(StageState::Closed);
                let feeds_back = stage.feeds_back();
                drop(stage);
                StageClosed {
                    stage: &node.path,
                    type_name: &node.type_name,
                }
                .log();

                if feeds_back {
                    return Ok(());
                }
                self.close_optional(node.main.get())
            }
        }
    }

    fn close_optional(&self, id: Option<NodeId>) -> EngineResult<()> {
        match id {
            Some(id) => self.close_node(id),
            None => Ok(()),
        }
    }
}
