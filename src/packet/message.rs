// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::literal::split_values;
use crate::errors::MessageError;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// A control message. It travels the same edges as units but carries no payload.
///
/// `destination` is either an exact stage name or a stage-type name.
/// A `single_use` message is consumed by the first stage that matches it;
/// otherwise it keeps travelling so other stages of the same type can react.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    destination: String,
    verb: String,
    values: Vec<Value>,
    single_use: bool,
}

impl Message {
    pub fn new(
        destination: impl Into<String>,
        verb: impl Into<String>,
        values: Vec<Value>,
    ) -> Result<Self, MessageError> {
        let destination = destination.into();
        let verb = verb.into();
        if destination.trim().is_empty() {
            return Err(MessageError::EmptyDestination);
        }
        if verb.trim().is_empty() {
            return Err(MessageError::EmptyVerb);
        }
        Ok(Self {
            destination,
            verb,
            values,
            single_use: true,
        })
    }

    /// Builds a message from `verb:value:value` text, converting values as literals.
    ///
    /// # Example
    /// ```
    /// use the_filterworks::packet::Message;
    /// use serde_json::Value;
    ///
    /// let msg = Message::parse("tank_queue", "reset:tank_size:3").unwrap();
    /// assert_eq!(msg.verb(), "reset");
    /// assert_eq!(msg.values(), &[Value::from("tank_size"), Value::from(3)]);
    /// ```
    pub fn parse(destination: impl Into<String>, command: &str) -> Result<Self, MessageError> {
        let (verb, values) = split_values(command.trim());
        Self::new(destination, verb, values)
    }

    pub fn with_single_use(mut self, single_use: bool) -> Self {
        self.single_use = single_use;
        self
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn single_use(&self) -> bool {
        self.single_use
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} <- {}", self.destination, self.verb)?;
        for value in &self.values {
            write!(f, ":{}", crate::config::literal::value_to_text(value))?;
        }
        Ok(())
    }
}
