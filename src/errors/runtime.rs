// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while units and messages move through a live graph.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingError {
    /// A branch forward was requested but the successor is not a fan-out node.
    #[error("Stage '{stage}' forwarded to its branch but its successor is not a fan-out")]
    NoFanOut { stage: String },

    /// A branch unit reached a fan-out that has no branch successor.
    #[error("Fan-out '{stage}' received a branch unit but has no branch")]
    MissingBranch { stage: String },

    #[error("Feeder '{stage}' must be followed by a tank_queue, found {}", .successor.as_deref().unwrap_or("nothing"))]
    FeederWithoutBuffer {
        stage: String,
        successor: Option<String>,
    },

    #[error("Stage '{stage}' is closed")]
    StageClosed { stage: String },
}

/// A stage failed while processing a unit.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stage '{stage}' failed: {reason}")]
pub struct DataProcessingError {
    pub stage: String,
    pub reason: String,
}

impl DataProcessingError {
    pub fn new(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Message destination is empty")]
    EmptyDestination,

    #[error("Message verb is empty")]
    EmptyVerb,

    #[error("Stage '{stage}' does not understand verb '{verb}'")]
    Unrecognised { stage: String, verb: String },

    #[error("Stage '{stage}' has no parameter '{parameter}'")]
    UnknownParameter { stage: String, parameter: String },

    #[error("Stage '{stage}': malformed '{verb}' message: {reason}")]
    Malformed {
        stage: String,
        verb: String,
        reason: String,
    },
}

/// A unit or message tried to enter a stage whose call is still active.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Stage '{stage}' re-entered while processing")]
pub struct ReentrancyError {
    pub stage: String,
}
