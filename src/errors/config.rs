// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Build-time errors. Any of these aborts graph construction.

use super::RouteSyntaxError;
use thiserror::Error;

/// Structural problems found while loading, declaring, binding, connecting
/// or validating a pipeline. No partially built graph is ever returned
/// alongside one of these.
#[derive(Error, Debug)]
pub enum StructuralConfigError {
    #[error(transparent)]
    RouteSyntax(#[from] RouteSyntaxError),

    /// No stage type and no sub-graph is registered under the resolved name.
    #[error("Stage '{stage}': no stage type or sub-graph named '{type_name}' is registered")]
    UnknownType { stage: String, type_name: String },

    #[error("Type '{type_name}' is already registered")]
    DuplicateType { type_name: String },

    /// An essential parameter was never bound.
    #[error("Stage '{stage}' (type '{type_name}'): essential parameter '{parameter}' is not bound")]
    MissingParameter {
        stage: String,
        parameter: String,
        type_name: String,
    },

    /// A parameter was bound twice with different values.
    #[error(
        "Stage '{stage}': parameter '{parameter}' already bound to {existing}, cannot rebind to {attempted}"
    )]
    ConflictingValue {
        stage: String,
        parameter: String,
        existing: String,
        attempted: String,
    },

    /// More positional route values than declared parameters.
    #[error("Stage '{stage}' (type '{type_name}'): {given} route values given but only {declared} parameters declared")]
    TooManyValues {
        stage: String,
        type_name: String,
        given: usize,
        declared: usize,
    },

    /// A config section names a parameter the stage type does not declare.
    #[error("Stage '{stage}' (type '{type_name}'): parameter '{parameter}' is not declared")]
    UndeclaredParameter {
        stage: String,
        parameter: String,
        type_name: String,
    },

    #[error("Stage '{stage}': parameter '{parameter}' is declared more than once")]
    DuplicateParameter { stage: String, parameter: String },

    #[error("Name '{name}' must be lower-case")]
    NotLowerCase { name: String },

    /// `${name}` did not match a parameter of the enclosing graph.
    #[error("Stage '{stage}': parameter '{parameter}' references '${{{reference}}}' which the enclosing graph does not bind")]
    UnresolvedSubstitution {
        stage: String,
        parameter: String,
        reference: String,
    },

    #[error("Stage '{stage}': parameter '{parameter}' references environment variable '{variable}' which is not set")]
    UnresolvedEnvironment {
        stage: String,
        parameter: String,
        variable: String,
    },

    #[error("No stage at path '{path}'")]
    UnknownStage { path: String },

    /// Sub-graph expansion went deeper than allowed (usually a self-including graph).
    #[error("Sub-graph '{type_name}' nests deeper than {depth} levels")]
    NestingTooDeep { type_name: String, depth: usize },

    /// A stage rejected a bound value while initialising.
    #[error("Stage '{stage}': invalid value for '{parameter}': {reason}")]
    InvalidValue {
        stage: String,
        parameter: String,
        reason: String,
    },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {reason}")]
    Parse { path: String, reason: String },
}
