// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while compiling route text.

use thiserror::Error;

/// A route could not be compiled. Every variant carries the 1-based line and
/// column at which the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RouteSyntaxError {
    /// A character outside the identifier set, whitespace, parentheses or comments.
    #[error("Illegal character '{ch}' in route at line {line}, column {column}")]
    IllegalCharacter { ch: char, line: usize, column: usize },

    /// A token appeared where the grammar does not allow it (for example a stray `)`).
    #[error("Unexpected token '{token}' in route at line {line}, column {column}")]
    UnexpectedToken {
        token: String,
        line: usize,
        column: usize,
    },

    /// Input ended inside an open branch.
    #[error("Unexpected end of route at line {line}, column {column}: unmatched '('")]
    UnexpectedEnd { line: usize, column: usize },

    /// `()` with nothing inside.
    #[error("Empty branch '()' in route at line {line}, column {column}")]
    EmptyBranch { line: usize, column: usize },

    /// A branch opened before any stage in its sequence.
    #[error("Branch without a preceding stage at line {line}, column {column}")]
    BranchWithoutStage { line: usize, column: usize },

    /// Two branches in a row with no stage between them.
    #[error("Adjacent branches at line {line}, column {column}: a stage must separate them")]
    AdjacentBranches { line: usize, column: usize },

    #[error("Empty route at line {line}, column {column}")]
    EmptyRoute { line: usize, column: usize },
}

impl RouteSyntaxError {
    /// `(line, column)` of the offending location.
    pub fn position(&self) -> (usize, usize) {
        match self {
            RouteSyntaxError::IllegalCharacter { line, column, .. }
            | RouteSyntaxError::UnexpectedToken { line, column, .. }
            | RouteSyntaxError::UnexpectedEnd { line, column }
            | RouteSyntaxError::EmptyBranch { line, column }
            | RouteSyntaxError::BranchWithoutStage { line, column }
            | RouteSyntaxError::AdjacentBranches { line, column }
            | RouteSyntaxError::EmptyRoute { line, column } => (*line, *column),
        }
    }
}
