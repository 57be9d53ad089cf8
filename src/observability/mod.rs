// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides the message types for all diagnostic and operational
//! logging in the engine. Message types follow a struct-based pattern with
//! `Display` implementations so that no log text is scattered through the
//! processing code.
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::engine` - graph assembly and shutdown
//! * `messages::route` - route compilation
//! * `messages::stage` - delivery, messages, dynamic parameters and closing
//! * `messages::tank` - tank queue resizing and forwarding
//! * `messages::validation` - configuration validation
//!
//! # Usage
//!
//! ```rust
//! use the_filterworks::observability::messages::stage::StageFailed;
//!
//! let error = std::io::Error::new(std::io::ErrorKind::Other, "bad unit");
//! let msg = StageFailed {
//!     stage: "reverse_string",
//!     error: &error,
//! };
//!
//! tracing::error!("{}", msg);
//! ```

pub mod messages;
