// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the tank queue trampoline.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A tank queue's capacity changed.
///
/// # Log Level
/// `debug!` - Detailed diagnostic information
///
/// # Example
/// ```
/// use the_filterworks::observability::messages::tank::TankResized;
///
/// let msg = TankResized {
///     stage: "tank_queue",
///     capacity: 3,
///     held: 1,
///     len: 3,
/// };
///
/// tracing::debug!("{}", msg);
/// ```
pub struct TankResized<'a> {
    pub stage: &'a str,
    pub capacity: i64,
    pub held: usize,
    pub len: usize,
}

impl Display for TankResized<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Tank '{}' resized to {}: {} held, {} slots",
            self.stage, self.capacity, self.held, self.len
        )
    }
}

impl StructuredLog for TankResized<'_> {
    fn log(&self) {
        tracing::debug!(
            stage = self.stage,
            capacity = self.capacity,
            held = self.held,
            len = self.len,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "tank_resized",
            span_name = name,
            stage = self.stage,
            capacity = self.capacity,
        )
    }
}

/// A tank released a unit downstream.
///
/// # Log Level
/// `trace!` - Per-unit detail, very noisy
pub struct TankForwarded<'a> {
    pub stage: &'a str,
    pub cycle: u64,
}

impl Display for TankForwarded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Tank '{}' released unit #{}", self.stage, self.cycle)
    }
}

impl StructuredLog for TankForwarded<'_> {
    fn log(&self) {
        tracing::trace!(stage = self.stage, cycle = self.cycle, "{}", self);
    }

    fn span(&self, name: &str) -> Span {
        tracing::trace_span!(
            "tank_forwarded",
            span_name = name,
            stage = self.stage,
            cycle = self.cycle,
        )
    }
}
