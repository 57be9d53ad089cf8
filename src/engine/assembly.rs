// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Pipeline assembly: declarations plus a compiled route become a linked,
//! parameter-bound [`Graph`].
//!
//! Assembly runs five phases over the whole nested hierarchy, each finishing
//! before the next starts:
//!
//! 1. **Declare** every member of every level and resolve its type.
//! 2. **Instantiate** one node per member (sub-graphs expand recursively).
//! 3. **Bind** parameters, parents before children.
//! 4. **Connect** edges, children before parents, then attach successors.
//! 5. **Validate** bindings and initialise every stage.
//!
//! Any failure aborts the build; no partial graph is returned.

use super::graph::{Graph, Node, NodeId, NodeKind};
use crate::config::consts::{FAN_OUT_TYPE, MAX_NESTING_DEPTH, RESERVED_PARAMS};
use crate::config::literal::{
    convert_literal, from_yaml, split_values, strip_values, type_candidates, value_to_text,
};
use crate::config::params::{Environment, ParamSet, ParamSource, ParamSpec, ParamTable};
use crate::config::registry::{Registry, StageDescriptor};
use crate::config::PipelineConfig;
use crate::errors::{EngineError, EngineResult, ReentrancyError, StructuralConfigError};
use crate::observability::messages::engine::{
    AssemblyCompleted, AssemblyFailed, AssemblyStarted,
};
use crate::observability::messages::validation::UnconnectedStage;
use crate::observability::messages::StructuredLog;
use crate::route::{self, CompiledRoute, EdgeKind, Target};
use crate::traits::Successor;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Instant;

/// Builds a [`Graph`] from a pipeline declaration and a registry.
///
/// # Example
/// ```
/// use the_filterworks::config::{parse_pipeline_config, ConfigFormat, Registry};
/// use the_filterworks::engine::GraphBuilder;
///
/// let config = parse_pipeline_config(
///     "main: {type: demo, description: Tagged text, keys: [tag]}\nroute: wrap:${tag}",
///     ConfigFormat::Yaml,
/// )
/// .unwrap();
/// let registry = Registry::with_builtins();
/// let graph = GraphBuilder::new(&config, &registry)
///     .param("tag", "<")
///     .build()
///     .unwrap();
///
/// assert_eq!(graph.param("wrap", "data_prefix"), Some("<".into()));
/// ```
pub struct GraphBuilder<'a> {
    config: &'a PipelineConfig,
    registry: &'a Registry,
    overrides: Vec<(String, Value)>,
    environment: Option<Environment>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a PipelineConfig, registry: &'a Registry) -> Self {
        Self {
            config,
            registry,
            overrides: Vec::new(),
            environment: None,
        }
    }

    /// Binds one of the top-level graph's declared parameters.
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.overrides.push((key.to_string(), value.into()));
        self
    }

    /// Variables for `%NAME` references in dynamic graphs. Defaults to empty.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    pub fn build(self) -> EngineResult<Graph> {
        let pipeline = self.config.main.type_name.clone();
        AssemblyStarted {
            pipeline: &pipeline,
            route: &self.config.route,
        }
        .log();
        let started = Instant::now();

        let environment = self.environment.unwrap_or_default();
        let mut assembly = Assembly {
            registry: self.registry,
            nodes: Vec::new(),
            levels: Vec::new(),
        };
        match assembly.run(self.config, &self.overrides, &environment) {
            Ok(root) => {
                let node_count = assembly.nodes.len() - 1;
                let graph = Graph::from_parts(assembly.nodes, root, environment)?;
                AssemblyCompleted {
                    pipeline: &pipeline,
                    node_count,
                    entry: graph.entry_name().as_deref().unwrap_or("none"),
                    duration: started.elapsed(),
                }
                .log();
                Ok(graph)
            }
            Err(error) => {
                AssemblyFailed {
                    pipeline: &pipeline,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }
}

enum MemberKind {
    Stage(StageDescriptor),
    SubGraph(Box<LevelDecl>),
    FanOut,
}

struct MemberDecl {
    name: String,
    type_name: String,
    kind: MemberKind,
    route_values: Vec<Vec<Value>>,
    section: Vec<(String, Value)>,
    connected: bool,
}

struct LevelDecl {
    config: PipelineConfig,
    route: CompiledRoute,
    declared: ParamSet,
    members: Vec<MemberDecl>,
}

struct Member {
    id: NodeId,
    route_values: Vec<Vec<Value>>,
    section: Vec<(String, Value)>,
    connected: bool,
}

struct Level {
    node: NodeId,
    route: CompiledRoute,
    dynamic: bool,
    keys: Vec<String>,
    members: Vec<Member>,
    ids: BTreeMap<String, NodeId>,
}

struct Assembly<'a> {
    registry: &'a Registry,
    nodes: Vec<Node>,
    /// Pre-order: every level precedes the levels nested inside it.
    levels: Vec<Level>,
}

impl Assembly<'_> {
    fn run(
        &mut self,
        config: &PipelineConfig,
        overrides: &[(String, Value)],
        environment: &Environment,
    ) -> EngineResult<NodeId> {
        let root_decl = declare(self.registry, config, 0)?;

        let mut root = Node::new(
            &config.main.type_name,
            "",
            &config.main.type_name,
            NodeKind::SubGraph {
                entry: Cell::new(None),
                exit: Cell::new(None),
            },
        );
        root.declared = root_decl.declared.clone();
        self.nodes.push(root);
        self.instantiate(root_decl, 0);

        self.bind_root(overrides)?;
        for index in 0..self.levels.len() {
            self.bind_level(index, environment)?;
        }

        for index in (0..self.levels.len()).rev() {
            self.connect_level(index)?;
        }
        self.attach_all()?;

        self.validate()?;
        self.configure_all()?;
        Ok(0)
    }

    fn instantiate(&mut self, decl: LevelDecl, level_node: NodeId) {
        let parent_path = self.nodes[level_node].path.clone();
        let LevelDecl {
            config,
            route,
            members,
            ..
        } = decl;
        let mut level = Level {
            node: level_node,
            route,
            dynamic: config.main.dynamic,
            keys: config.main.keys.clone(),
            members: Vec::with_capacity(members.len()),
            ids: BTreeMap::new(),
        };

        let mut children = Vec::new();
        for member in members {
            let path = if parent_path.is_empty() {
                member.name.clone()
            } else {
                format!("{}.{}", parent_path, member.name)
            };
            let (kind, declared, child) = match member.kind {
                MemberKind::Stage(descriptor) => (
                    NodeKind::Stage(RefCell::new(descriptor.instantiate())),
                    descriptor.params.clone(),
                    None,
                ),
                MemberKind::FanOut => (NodeKind::FanOut, ParamSet::new(), None),
                MemberKind::SubGraph(child) => (
                    NodeKind::SubGraph {
                        entry: Cell::new(None),
                        exit: Cell::new(None),
                    },
                    child.declared.clone(),
                    Some(child),
                ),
            };
            let mut node = Node::new(&member.name, &path, &member.type_name, kind);
            node.declared = declared;
            let id = self.nodes.len();
            self.nodes.push(node);

            level.ids.insert(member.name.clone(), id);
            level.members.push(Member {
                id,
                route_values: member.route_values,
                section: member.section,
                connected: member.connected,
            });
            if let Some(child) = child {
                children.push((child, id));
            }
        }

        self.levels.push(level);
        for (child, id) in children {
            self.instantiate(*child, id);
        }
    }

    fn bind_root(&mut self, overrides: &[(String, Value)]) -> Result<(), StructuralConfigError> {
        let root = &mut self.nodes[0];
        let table = root.params.get_mut();
        for (key, value) in overrides {
            if !root.declared.contains(key) {
                return Err(StructuralConfigError::UndeclaredParameter {
                    stage: root.name.clone(),
                    parameter: key.clone(),
                    type_name: root.type_name.clone(),
                });
            }
            table.set_checked(key, value.clone())?;
        }
        fill_defaults(table, &root.declared, self.registry);
        Ok(())
    }

    fn bind_level(
        &mut self,
        index: usize,
        environment: &Environment,
    ) -> Result<(), StructuralConfigError> {
        let level = &self.levels[index];
        let enclosing = self.nodes[level.node].params.borrow().clone();

        for member in &level.members {
            let node = &mut self.nodes[member.id];
            let mut table = node.params.borrow().clone();

            for values in &member.route_values {
                if values.len() > node.declared.len() {
                    return Err(StructuralConfigError::TooManyValues {
                        stage: node.path.clone(),
                        type_name: node.type_name.clone(),
                        given: values.len(),
                        declared: node.declared.len(),
                    });
                }
                for (spec, value) in node.declared.iter().zip(values) {
                    let value = resolve_reference(value, &enclosing, &node.path, &spec.name)?;
                    table.set_checked(&spec.name, value)?;
                }
            }

            for (key, value) in &member.section {
                if node.declared.contains(key) {
                    let value = resolve_reference(value, &enclosing, &node.path, key)?;
                    table.set_checked(key, value)?;
                }
            }

            fill_defaults(&mut table, &node.declared, self.registry);

            // Defaults and essentials may still carry references.
            let bound: Vec<(String, Value)> =
                table.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
            for (key, value) in &bound {
                if let Some(text) = value.as_str().filter(|t| t.contains("${")) {
                    let substituted = substitute(text, &enclosing, &node.path, key)?;
                    table.set(key, substituted);
                }
            }

            if level.dynamic {
                let bound: Vec<(String, Value)> =
                    table.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                for (key, value) in bound {
                    if let ParamSource::Env(variable) = ParamSource::classify(value, true) {
                        let resolved = environment.resolve(&variable).ok_or_else(|| {
                            StructuralConfigError::UnresolvedEnvironment {
                                stage: node.path.clone(),
                                parameter: key.clone(),
                                variable: variable.clone(),
                            }
                        })?;
                        table.set(&key, resolved);
                        node.dynamic.push((key, variable));
                    }
                }
            }

            *node.params.get_mut() = table;
        }
        Ok(())
    }

    fn connect_level(&self, index: usize) -> Result<(), StructuralConfigError> {
        let level = &self.levels[index];
        let lookup = |reference: &str| {
            level
                .ids
                .get(strip_values(reference))
                .copied()
                .ok_or_else(|| StructuralConfigError::UnknownStage {
                    path: reference.to_string(),
                })
        };

        let mut entry = None;
        let mut exit = None;
        for edge in &level.route.edges {
            let from = lookup(&edge.from)?;
            entry.get_or_insert(from);
            match (&edge.to, edge.kind) {
                (Target::Terminal, _) => exit = Some(from),
                (Target::Stage(to), EdgeKind::Branch) => {
                    self.nodes[from].branch.set(Some(lookup(to)?));
                }
                (Target::Stage(to), EdgeKind::Main) => {
                    Graph::link_main(&self.nodes, from, Some(lookup(to)?));
                }
            }
        }

        if let NodeKind::SubGraph {
            entry: level_entry,
            exit: level_exit,
        } = &self.nodes[level.node].kind
        {
            level_entry.set(entry);
            level_exit.set(exit);
        }
        Ok(())
    }

    fn attach_all(&self) -> EngineResult<()> {
        for node in &self.nodes {
            let NodeKind::Stage(cell) = &node.kind else {
                continue;
            };
            let successor = node.main.get().map(|id| {
                let next = &self.nodes[id];
                let tank = match &next.kind {
                    NodeKind::Stage(next_cell) => {
                        next_cell.try_borrow().ok().and_then(|stage| stage.tank())
                    }
                    _ => None,
                };
                (next.path.as_str(), next.type_name.as_str(), tank)
            });
            let successor = successor.map(|(name, type_name, tank)| Successor {
                name,
                type_name,
                tank,
            });

            let mut stage = cell.try_borrow_mut().map_err(|_| ReentrancyError {
                stage: node.path.clone(),
            })?;
            stage.attach(&node.path, successor.as_ref())?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), StructuralConfigError> {
        let root = &self.nodes[0];
        check_essentials(root)?;

        for level in &self.levels {
            let owner = &self.nodes[level.node];
            let mut seen: Vec<String> = Vec::new();
            for key in &level.keys {
                let name = ParamSpec::parse(key).name;
                if name != name.to_lowercase() {
                    return Err(StructuralConfigError::NotLowerCase {
                        name: format!("{}.{}", owner.type_name, name),
                    });
                }
                if seen.contains(&name) {
                    return Err(StructuralConfigError::DuplicateParameter {
                        stage: owner.type_name.clone(),
                        parameter: name,
                    });
                }
                seen.push(name);
            }

            for member in &level.members {
                let node = &self.nodes[member.id];
                if node.name != node.name.to_lowercase() {
                    return Err(StructuralConfigError::NotLowerCase {
                        name: node.path.clone(),
                    });
                }
                for (key, _) in &member.section {
                    if !RESERVED_PARAMS.contains(&key.as_str()) && !node.declared.contains(key) {
                        return Err(StructuralConfigError::UndeclaredParameter {
                            stage: node.path.clone(),
                            parameter: key.clone(),
                            type_name: node.type_name.clone(),
                        });
                    }
                }
                check_essentials(node)?;
                if !member.connected {
                    UnconnectedStage { stage: &node.path }.log();
                }
            }
        }
        Ok(())
    }

    fn configure_all(&self) -> EngineResult<()> {
        for node in &self.nodes {
            if let NodeKind::Stage(cell) = &node.kind {
                let params = node.params.borrow().clone();
                let mut stage = cell.try_borrow_mut().map_err(|_| ReentrancyError {
                    stage: node.path.clone(),
                })?;
                stage.configure(&params).map_err(EngineError::from)?;
            }
        }
        Ok(())
    }
}

fn declare(
    registry: &Registry,
    config: &PipelineConfig,
    depth: usize,
) -> Result<LevelDecl, StructuralConfigError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(StructuralConfigError::NestingTooDeep {
            type_name: config.main.type_name.clone(),
            depth: MAX_NESTING_DEPTH,
        });
    }
    let route = route::compile(&config.route)?;

    let mut names = route.ordered_names.clone();
    for name in config.stages.keys() {
        if !names.contains(name) {
            names.push(name.clone());
        }
    }

    let mut members = Vec::with_capacity(names.len());
    for name in names {
        let section = config.stages.get(&name);
        let connected = route.ordered_names.contains(&name);
        let route_values = route
            .referenced_names
            .iter()
            .filter(|reference| strip_values(reference) == name)
            .map(|reference| split_values(reference).1)
            .filter(|values| !values.is_empty())
            .collect();
        let section_values: Vec<(String, Value)> = section
            .map(|s| {
                s.params
                    .iter()
                    .map(|(k, v)| (k.clone(), from_yaml(v)))
                    .collect()
            })
            .unwrap_or_default();

        let (type_name, kind) = if route.fan_out_names().any(|f| *f == name) {
            (FAN_OUT_TYPE.to_string(), MemberKind::FanOut)
        } else {
            let explicit = section.and_then(|s| s.type_name.as_deref());
            resolve_type(registry, &name, explicit, depth)?
        };

        members.push(MemberDecl {
            name,
            type_name,
            kind,
            route_values,
            section: section_values,
            connected,
        });
    }

    Ok(LevelDecl {
        declared: ParamSet::parse(&config.main.keys),
        config: config.clone(),
        route,
        members,
    })
}

/// Explicit type first, otherwise the name and its shortened forms. Stage
/// types win over sub-graphs of the same name.
fn resolve_type(
    registry: &Registry,
    name: &str,
    explicit: Option<&str>,
    depth: usize,
) -> Result<(String, MemberKind), StructuralConfigError> {
    let candidates = match explicit {
        Some(explicit) => vec![explicit.to_string()],
        None => type_candidates(name),
    };
    for candidate in &candidates {
        if let Some(descriptor) = registry.stage(candidate) {
            return Ok((candidate.clone(), MemberKind::Stage(descriptor.clone())));
        }
    }
    for candidate in &candidates {
        if let Some(graph) = registry.graph(candidate) {
            let child = declare(registry, graph, depth + 1)?;
            return Ok((candidate.clone(), MemberKind::SubGraph(Box::new(child))));
        }
    }
    Err(StructuralConfigError::UnknownType {
        stage: name.to_string(),
        type_name: explicit.unwrap_or(name).to_string(),
    })
}

fn fill_defaults(table: &mut ParamTable, declared: &ParamSet, registry: &Registry) {
    for spec in declared.iter() {
        match &spec.default {
            Some(default) => table.set_default(&spec.name, default.clone()),
            None => {
                if let Some(pooled) = registry.essential(&spec.name) {
                    table.set_default(&spec.name, pooled.clone());
                }
            }
        }
    }
}

fn check_essentials(node: &Node) -> Result<(), StructuralConfigError> {
    let params = node.params.borrow();
    for spec in node.declared.essentials() {
        if !params.contains(&spec.name) {
            return Err(StructuralConfigError::MissingParameter {
                stage: if node.path.is_empty() {
                    node.name.clone()
                } else {
                    node.path.clone()
                },
                parameter: spec.name.clone(),
                type_name: node.type_name.clone(),
            });
        }
    }
    Ok(())
}

/// One-shot `${name}` substitution from the enclosing graph's parameters.
/// A value that is exactly one reference takes the referenced value as-is.
/// Substitutes `${name}` references before a value is bound, so the
/// re-binding check compares resolved values.
fn resolve_reference(
    value: &Value,
    enclosing: &ParamTable,
    stage: &str,
    parameter: &str,
) -> Result<Value, StructuralConfigError> {
    match value.as_str().filter(|text| text.contains("${")) {
        Some(text) => substitute(text, enclosing, stage, parameter),
        None => Ok(value.clone()),
    }
}

fn substitute(
    text: &str,
    enclosing: &ParamTable,
    stage: &str,
    parameter: &str,
) -> Result<Value, StructuralConfigError> {
    let unresolved = |reference: &str| StructuralConfigError::UnresolvedSubstitution {
        stage: stage.to_string(),
        parameter: parameter.to_string(),
        reference: reference.to_string(),
    };

    if let Some(reference) = text.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
        if !reference.contains(['$', '{', '}']) {
            return enclosing
                .get(reference)
                .cloned()
                .ok_or_else(|| unresolved(reference));
        }
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            return Err(unresolved(after));
        };
        let reference = &after[..end];
        let value = enclosing.get(reference).ok_or_else(|| unresolved(reference))?;
        out.push_str(&value_to_text(value));
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(convert_literal(&out))
}
