// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Data units and control messages: the two things that travel along edges.

mod message;
mod unit;

pub use message::Message;
pub use unit::{Edge, Unit};

/// Anything a stage can receive.
#[derive(Debug)]
pub enum Packet {
    Unit(Unit),
    Message(Message),
}

impl From<Unit> for Packet {
    fn from(unit: Unit) -> Self {
        Packet::Unit(unit)
    }
}

impl From<Message> for Packet {
    fn from(message: Message) -> Self {
        Packet::Message(message)
    }
}
