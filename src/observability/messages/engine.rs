// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for graph assembly and shutdown.
//!
//! This module contains message types for logging events related to:
//! * Building a graph from a pipeline declaration
//! * Assembly failures
//! * Graph shutdown

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// Graph assembly started.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::engine::AssemblyStarted;
///
/// let msg = AssemblyStarted {
///     pipeline: "factorial",
///     route: "tank_queue factorial_calc sink",
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct AssemblyStarted<'a> {
    pub pipeline: &'a str,
    pub route: &'a str,
}

impl Display for AssemblyStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Assembling pipeline '{}'", self.pipeline)
    }
}

impl StructuredLog for AssemblyStarted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            route = self.route.trim(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "assembly",
            span_name = name,
            pipeline = self.pipeline,
        )
    }
}

/// Graph assembly completed.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::engine::AssemblyCompleted;
/// use std::time::Duration;
///
/// let msg = AssemblyCompleted {
///     pipeline: "factorial",
///     node_count: 6,
///     entry: "tank_queue",
///     duration: Duration::from_millis(2),
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct AssemblyCompleted<'a> {
    pub pipeline: &'a str,
    pub node_count: usize,
    pub entry: &'a str,
    pub duration: std::time::Duration,
}

impl Display for AssemblyCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Assembled pipeline '{}': {} nodes, entry '{}', in {:?}",
            self.pipeline, self.node_count, self.entry, self.duration
        )
    }
}

impl StructuredLog for AssemblyCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            node_count = self.node_count,
            entry = self.entry,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "assembly_completed",
            span_name = name,
            pipeline = self.pipeline,
            node_count = self.node_count,
            duration = ?self.duration,
        )
    }
}

/// Graph assembly failed. No graph was produced.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::engine::AssemblyFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "unknown type");
/// let msg = AssemblyFailed {
///     pipeline: "factorial",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct AssemblyFailed<'a> {
    pub pipeline: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for AssemblyFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to assemble pipeline '{}': {}", self.pipeline, self.error)
    }
}

impl StructuredLog for AssemblyFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pipeline = self.pipeline,
            error = %self.error,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "assembly_failed",
            span_name = name,
            pipeline = self.pipeline,
            error = %self.error,
        )
    }
}

/// Graph shutdown started.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ShutdownStarted<'a> {
    pub pipeline: &'a str,
}

impl Display for ShutdownStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Shutting down pipeline '{}'", self.pipeline)
    }
}

impl StructuredLog for ShutdownStarted<'_> {
    fn log(&self) {
        tracing::info!(pipeline = self.pipeline, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!("shutdown", span_name = name, pipeline = self.pipeline)
    }
}

/// Every stage of the graph is closed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ShutdownCompleted<'a> {
    pub pipeline: &'a str,
    pub duration: std::time::Duration,
}

impl Display for ShutdownCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' shut down in {:?}",
            self.pipeline, self.duration
        )
    }
}

impl StructuredLog for ShutdownCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            pipeline = self.pipeline,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "shutdown_completed",
            span_name = name,
            pipeline = self.pipeline,
            duration = ?self.duration,
        )
    }
}
