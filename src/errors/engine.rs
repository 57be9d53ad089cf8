// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::{
    DataProcessingError, MessageError, ReentrancyError, RoutingError, StructuralConfigError,
};
use thiserror::Error;

/// Top-level error for anything the engine does.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Structural(#[from] StructuralConfigError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error(transparent)]
    DataProcessing(#[from] DataProcessingError),

    #[error(transparent)]
    Message(#[from] MessageError),

    #[error(transparent)]
    Reentrancy(#[from] ReentrancyError),
}

pub type EngineResult<T> = Result<T, EngineError>;
