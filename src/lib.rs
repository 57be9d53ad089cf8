// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;     // declarations, parameters + registry
pub mod engine;     // assembly, graph runtime, trampoline storage
pub mod errors;     // error handling
pub mod observability;
pub mod packet;     // units and control messages
pub mod route;      // route-grammar compiler
pub mod stages;     // built-in stage library
pub mod traits;     // stage contract
