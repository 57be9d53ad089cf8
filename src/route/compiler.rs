// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Turns a parsed pipe into an ordered edge list with synthesized fan-out nodes.

use super::parser::Element;
use crate::config::consts::{FAN_OUT_OFFSET, FAN_OUT_PREFIX, POSITION_STEP};
use crate::config::literal::strip_values;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgeKind {
    /// Sorted first: a fan-out's branch is always connected before its main.
    Branch,
    Main,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Stage(String),
    Terminal,
}

/// A directed edge. Names keep any `:values` suffix as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEdge {
    pub from: String,
    pub kind: EdgeKind,
    pub to: Target,
}

impl RouteEdge {
    pub fn is_terminal(&self) -> bool {
        self.to == Target::Terminal
    }
}

impl Display for RouteEdge {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let arrow = match self.kind {
            EdgeKind::Main => ">>>",
            EdgeKind::Branch => "^^^",
        };
        match &self.to {
            Target::Stage(name) => write!(f, "{} {} {}", self.from, arrow, name),
            Target::Terminal => write!(f, "{} {} None", self.from, arrow),
        }
    }
}

/// Output of route compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRoute {
    /// Bare node names in position order, fan-outs included, without duplicates.
    pub ordered_names: Vec<String>,
    pub edges: Vec<RouteEdge>,
    /// Stage references exactly as written, in document order.
    pub referenced_names: Vec<String>,
}

impl CompiledRoute {
    /// Edges rendered as `A >>> B`, `hb ^^^ B`, `B >>> None`.
    pub fn connections(&self) -> Vec<String> {
        self.edges.iter().map(|e| e.to_string()).collect()
    }

    pub fn fan_out_names(&self) -> impl Iterator<Item = &String> {
        self.ordered_names
            .iter()
            .filter(|n| n.starts_with(FAN_OUT_PREFIX))
    }
}

struct TaggedEdge {
    position: u32,
    edge: RouteEdge,
}

#[derive(Default)]
struct Compiler {
    position: u32,
    fan_outs: usize,
    edges: Vec<TaggedEdge>,
    nodes: Vec<(u32, String)>,
    referenced: Vec<String>,
}

impl Compiler {
    fn edge(&mut self, position: u32, from: &str, kind: EdgeKind, to: Target) {
        self.edges.push(TaggedEdge {
            position,
            edge: RouteEdge {
                from: from.to_string(),
                kind,
                to,
            },
        });
    }

    /// Compiles one pipe and returns the reference at its head.
    fn pipe(&mut self, elements: &[Element]) -> String {
        let mut head: Option<String> = None;
        let mut previous: Option<(String, u32)> = None;

        for element in elements {
            match element {
                Element::Stage(reference) => {
                    self.position += POSITION_STEP;
                    let position = self.position;
                    self.nodes.push((position, strip_values(reference).to_string()));
                    self.referenced.push(reference.clone());
                    if let Some((from, from_position)) = &previous {
                        self.edge(
                            *from_position,
                            from,
                            EdgeKind::Main,
                            Target::Stage(reference.clone()),
                        );
                    }
                    head.get_or_insert_with(|| reference.clone());
                    previous = Some((reference.clone(), position));
                }
                Element::Branch(inner) => {
                    // The parser guarantees a branch always follows a stage.
                    let Some((from, from_position)) = previous.take() else {
                        continue;
                    };
                    self.fan_outs += 1;
                    let fan_out = format!("{}{:02}", FAN_OUT_PREFIX, self.fan_outs);
                    let fan_out_position = from_position + FAN_OUT_OFFSET;
                    self.nodes.push((fan_out_position, fan_out.clone()));
                    self.edge(
                        from_position,
                        &from,
                        EdgeKind::Main,
                        Target::Stage(fan_out.clone()),
                    );

                    let inner_head = self.pipe(inner);
                    self.edge(
                        fan_out_position,
                        &fan_out,
                        EdgeKind::Branch,
                        Target::Stage(inner_head),
                    );
                    previous = Some((fan_out, fan_out_position));
                }
            }
        }

        if let Some((from, position)) = previous {
            self.edge(position, &from, EdgeKind::Main, Target::Terminal);
        }
        head.unwrap_or_default()
    }

    fn finish(mut self) -> CompiledRoute {
        // Stable: ties keep document order.
        self.edges.sort_by_key(|t| (t.position, t.edge.kind));
        let mut edges: Vec<RouteEdge> = Vec::with_capacity(self.edges.len());
        for tagged in self.edges {
            if !edges.contains(&tagged.edge) {
                edges.push(tagged.edge);
            }
        }

        self.nodes.sort_by_key(|(position, _)| *position);
        let mut ordered_names: Vec<String> = Vec::with_capacity(self.nodes.len());
        for (_, name) in self.nodes {
            if !ordered_names.contains(&name) {
                ordered_names.push(name);
            }
        }

        CompiledRoute {
            ordered_names,
            edges,
            referenced_names: self.referenced,
        }
    }
}

/// Compiles a parsed, non-empty pipe.
pub fn compile_pipe(elements: &[Element]) -> CompiledRoute {
    let mut compiler = Compiler::default();
    compiler.pipe(elements);
    compiler.finish()
}
