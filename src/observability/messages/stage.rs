// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for stage-level activity.
//!
//! This module contains message types for logging events related to:
//! * Units moving along main and branch edges
//! * Control messages opened by their destination stage
//! * Parameter changes through `reset` and environment refresh
//! * Stage closing, deferral and suppressed re-entrancy
//! * Stage processing failures

use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Message};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A unit was handed to the next node.
///
/// # Log Level
/// `trace!` - Per-unit detail, very noisy
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::stage::UnitForwarded;
/// use the_filterworks::packet::Edge;
///
/// let msg = UnitForwarded {
///     from: "branch_if",
///     to: "hidden_brancher_01",
///     edge: Edge::Branch,
/// };
///
/// tracing::trace!("{}", msg);
/// ```
pub struct UnitForwarded<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub edge: Edge,
}

impl Display for UnitForwarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} -> {} ({:?})", self.from, self.to, self.edge)
    }
}

impl StructuredLog for UnitForwarded<'_> {
    fn log(&self) {
        tracing::trace!(
            from = self.from,
            to = self.to,
            edge = ?self.edge,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "unit_forwarded",
            span_name = name,
            from = self.from,
            to = self.to,
            edge = ?self.edge,
        )
    }
}

/// A fan-out node picked an edge for a unit.
///
/// # Log Level
/// `trace!` - Per-unit detail, very noisy
pub struct FanOutRouted<'a> {
    pub fan_out: &'a str,
    pub edge: Edge,
}

impl Display for FanOutRouted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} routing unit to {:?}", self.fan_out, self.edge)
    }
}

impl StructuredLog for FanOutRouted<'_> {
    fn log(&self) {
        tracing::trace!(fan_out = self.fan_out, edge = ?self.edge, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "fan_out_routed",
            span_name = name,
            fan_out = self.fan_out,
            edge = ?self.edge,
        )
    }
}

/// A control message reached a stage it was addressed to.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::stage::MessageOpened;
/// use the_filterworks::packet::Message;
///
/// let message = Message::parse("tank_queue", "reset:tank_size:3").unwrap();
/// let msg = MessageOpened {
///     stage: "tank_queue",
///     message: &message,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct MessageOpened<'a> {
    pub stage: &'a str,
    pub message: &'a Message,
}

impl Display for MessageOpened<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' opened message {}", self.stage, self.message)
    }
}

impl StructuredLog for MessageOpened<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            verb = self.message.verb(),
            single_use = self.message.single_use(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "message_opened",
            span_name = name,
            stage = self.stage,
            verb = self.message.verb(),
        )
    }
}

/// A `reset` message rebound one of a stage's parameters.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ParameterReset<'a> {
    pub stage: &'a str,
    pub parameter: &'a str,
    pub value: &'a Value,
}

impl Display for ParameterReset<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' reset '{}' to {}",
            self.stage, self.parameter, self.value
        )
    }
}

impl StructuredLog for ParameterReset<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            parameter = self.parameter,
            value = %self.value,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "parameter_reset",
            span_name = name,
            stage = self.stage,
            parameter = self.parameter,
        )
    }
}

/// An environment-sourced parameter changed value before a unit.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct DynamicParameterRefreshed<'a> {
    pub stage: &'a str,
    pub parameter: &'a str,
    pub variable: &'a str,
}

impl Display for DynamicParameterRefreshed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' refreshed '{}' from %{}",
            self.stage, self.parameter, self.variable
        )
    }
}

impl StructuredLog for DynamicParameterRefreshed<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            parameter = self.parameter,
            variable = self.variable,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "dynamic_parameter_refreshed",
            span_name = name,
            stage = self.stage,
            parameter = self.parameter,
            variable = self.variable,
        )
    }
}

/// Close reached a stage that is still inside a call. It closes once the
/// call returns.
///
/// # Log Level
/// `warn!` - Unusual but handled
pub struct CloseDeferred<'a> {
    pub stage: &'a str,
}

impl Display for CloseDeferred<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' is busy; close deferred", self.stage)
    }
}

impl StructuredLog for CloseDeferred<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("close_deferred", span_name = name, stage = self.stage)
    }
}

/// A re-entrant delivery was dropped because the graph is shutting down.
///
/// # Log Level
/// `warn!` - Unusual but handled
pub struct ReentrancySuppressed<'a> {
    pub stage: &'a str,
}

impl Display for ReentrancySuppressed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Re-entrant delivery to '{}' suppressed during shutdown",
            self.stage
        )
    }
}

impl StructuredLog for ReentrancySuppressed<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::warn_span!("reentrancy_suppressed", span_name = name, stage = self.stage)
    }
}

/// A stage flushed and closed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct StageClosed<'a> {
    pub stage: &'a str,
    pub type_name: &'a str,
}

impl Display for StageClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Closed stage '{}' ({})", self.stage, self.type_name)
    }
}

impl StructuredLog for StageClosed<'_> {
    fn log(&self) {
        tracing::debug!(stage = self.stage, type_name = self.type_name, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "stage_closed",
            span_name = name,
            stage = self.stage,
            type_name = self.type_name,
        )
    }
}

/// A stage started processing a unit.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::stage::UnitProcessingStarted;
///
/// let msg = UnitProcessingStarted {
///     stage: "reverse_string",
///     input_size: 5,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct UnitProcessingStarted<'a> {
    pub stage: &'a str,
    pub input_size: usize,
}

impl Display for UnitProcessingStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' processing {} bytes",
            self.stage, self.input_size
        )
    }
}

impl StructuredLog for UnitProcessingStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            input_size = self.input_size,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "unit_processing",
            span_name = name,
            stage = self.stage,
            input_size = self.input_size,
        )
    }
}

/// A stage finished processing a unit.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct UnitProcessingCompleted<'a> {
    pub stage: &'a str,
    pub input_size: usize,
    pub output_size: usize,
    pub duration: std::time::Duration,
}

impl Display for UnitProcessingCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' processed {} -> {} bytes in {:?}",
            self.stage, self.input_size, self.output_size, self.duration
        )
    }
}

impl StructuredLog for UnitProcessingCompleted<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            input_size = self.input_size,
            output_size = self.output_size,
            duration_us = self.duration.as_micros() as u64,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "unit_processing_completed",
            span_name = name,
            stage = self.stage,
            duration = ?self.duration,
        )
    }
}

/// A stage's step failed on a unit.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::stage::StageFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::Other, "not utf-8");
/// let msg = StageFailed {
///     stage: "script",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct StageFailed<'a> {
    pub stage: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for StageFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Stage '{}' failed: {}", self.stage, self.error)
    }
}

impl StructuredLog for StageFailed<'_> {
    fn log(&self) {
        tracing::error!(stage = self.stage, error = %self.error, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::error_span!(
            "stage_failed",
            span_name = name,
            stage = self.stage,
            error = %self.error,
        )
    }
}
