// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Every diagnostic the engine emits is one of these structs. Each implements
//! `Display` for the human-readable line and [`StructuredLog`] to emit it
//! with structured fields at its fixed level.
//!
//! # Organization
//!
//! * `engine` - graph assembly and shutdown
//! * `route` - route compilation
//! * `stage` - unit and message delivery, parameter changes, closing
//! * `tank` - trampoline buffer activity
//! * `validation` - configuration validation
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_filterworks::observability::messages::engine::AssemblyStarted;
//! use the_filterworks::observability::messages::StructuredLog;
//!
//! let msg = AssemblyStarted {
//!     pipeline: "factorial",
//!     route: "tank_queue factorial_calc sink",
//! };
//!
//! msg.log();
//! ```

use tracing::Span;

pub mod engine;
pub mod route;
pub mod stage;
pub mod tank;
pub mod validation;

/// Emits a message as a structured `tracing` event, or opens a span carrying
/// the same fields.
pub trait StructuredLog {
    fn log(&self);

    fn span(&self, name: &str) -> Span;
}
