// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for route compilation.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A route compiled to an edge list.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::route::RouteCompiled;
///
/// let msg = RouteCompiled {
///     route: "read (write) reverse",
///     node_count: 4,
///     edge_count: 4,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct RouteCompiled<'a> {
    pub route: &'a str,
    pub node_count: usize,
    pub edge_count: usize,
}

impl Display for RouteCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled route: {} nodes, {} edges",
            self.node_count, self.edge_count
        )
    }
}

impl StructuredLog for RouteCompiled<'_> {
    fn log(&self) {
        tracing::debug!(
            route = self.route.trim(),
            node_count = self.node_count,
            edge_count = self.edge_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "route_compiled",
            span_name = name,
            node_count = self.node_count,
            edge_count = self.edge_count,
        )
    }
}

/// A route failed to compile.
///
/// # Log Level
/// `warn!` - The caller receives the error; this records where it came from
pub struct RouteRejected<'a> {
    pub route: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for RouteRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected route: {}", self.error)
    }
}

impl StructuredLog for RouteRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            route = self.route.trim(),
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!(
            "route_rejected",
            span_name = name,
            error = %self.error,
        )
    }
}
