// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod assembly;
mod graph;
mod link;
pub mod tank;
#[cfg(test)]
mod integration_tests;

pub use assembly::GraphBuilder;
pub use graph::{Graph, NodeId, StageState};
pub use link::Link;
