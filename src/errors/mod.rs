// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod config;
mod engine;
mod route;
mod runtime;

pub use config::StructuralConfigError;
pub use engine::{EngineError, EngineResult};
pub use route::RouteSyntaxError;
pub use runtime::{DataProcessingError, MessageError, ReentrancyError, RoutingError};
