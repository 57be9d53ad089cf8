// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Built-in stage library.
//!
//! These are the collaborator stages the engine ships with: enough to build
//! branching, messaging and recursive graphs out of the box. Every type here
//! is registered by [`crate::config::Registry::with_builtins`].

pub mod branching;
pub mod builtin;
pub mod factorial;
pub mod messaging;
pub mod pass_through;
pub mod reverse_string;
pub mod script;
pub mod seq_packet;
pub mod sink;
pub mod tank_feed;
pub mod tank_queue;
pub mod wrap;

#[cfg(test)]
pub mod stub;
