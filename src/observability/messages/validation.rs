// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for configuration validation warnings and errors.
//!
//! This module contains message types for logging events related to:
//! * Validation of loaded pipeline declarations
//! * Declared stages the route never connects

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A stage has a section under `stages:` but no place in the route. It is
/// built and validated but never receives units.
///
/// # Log Level
/// `warn!` - Potential issue, doesn't block execution
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::validation::UnconnectedStage;
///
/// let msg = UnconnectedStage { stage: "spare_sink" };
///
/// tracing::warn!("{}", msg);
/// ```
pub struct UnconnectedStage<'a> {
    pub stage: &'a str,
}

impl Display for UnconnectedStage<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Stage '{}' is declared but not connected by the route",
            self.stage
        )
    }
}

impl StructuredLog for UnconnectedStage<'_> {
    fn log(&self) {
        tracing::warn!(stage = self.stage, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::WARN,
            "span_name",
            name = name,
            stage = self.stage,
        )
    }
}

/// Configuration validation started.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::validation::ValidationStarted;
///
/// let msg = ValidationStarted {
///     pipeline: "factorial",
///     stage_count: 5,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct ValidationStarted<'a> {
    pub pipeline: &'a str,
    pub stage_count: usize,
}

impl Display for ValidationStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Validating pipeline '{}' with {} stage sections",
            self.pipeline, self.stage_count
        )
    }
}

impl StructuredLog for ValidationStarted<'_> {
    fn log(&self) {
        tracing::debug!(
            pipeline = self.pipeline,
            stage_count = self.stage_count,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            pipeline = self.pipeline,
            stage_count = self.stage_count,
        )
    }
}

/// Configuration validation passed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
pub struct ValidationCompleted<'a> {
    pub pipeline: &'a str,
}

impl Display for ValidationCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Pipeline '{}' passed validation", self.pipeline)
    }
}

impl StructuredLog for ValidationCompleted<'_> {
    fn log(&self) {
        tracing::debug!(pipeline = self.pipeline, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::DEBUG,
            "span_name",
            name = name,
            pipeline = self.pipeline,
        )
    }
}

/// Configuration validation failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::validation::ValidationFailed;
///
/// let msg = ValidationFailed {
///     pipeline: "Factorial",
///     reason: "type must be lower case",
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ValidationFailed<'a> {
    pub pipeline: &'a str,
    pub reason: &'a str,
}

impl Display for ValidationFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Pipeline '{}' failed validation: {}",
            self.pipeline, self.reason
        )
    }
}

impl StructuredLog for ValidationFailed<'_> {
    fn log(&self) {
        tracing::error!(
            pipeline = self.pipeline,
            reason = self.reason,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::span!(
            tracing::Level::ERROR,
            "span_name",
            name = name,
            pipeline = self.pipeline,
            reason = self.reason,
        )
    }
}
