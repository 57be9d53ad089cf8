// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Stages that talk to other stages by sending control messages down the
//! main edge ahead of the unit that triggered them.

use crate::config::literal::value_to_text;
use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult, StructuralConfigError};
use crate::packet::{Edge, Message, Unit};
use crate::traits::Stage;
use serde_json::Value;

/// Sends a fixed message, then the unit.
///
/// `message` is `verb:value:value` text addressed to `destination`.
#[derive(Debug, Default)]
pub struct SendMessage {
    message: Option<Message>,
}

impl Stage for SendMessage {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        if let Some(message) = &self.message {
            link.forward_message(message.clone())?;
        }
        link.forward(unit, Edge::Main)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        let destination = params.text("destination")?;
        let command = params.text("message")?;
        let message = Message::parse(destination, &command)
            .map_err(|e| params.invalid("message", e.to_string()))?;
        self.message = Some(message.with_single_use(params.flag("single_use")?));
        Ok(())
    }
}

/// Resets a parameter on `destination` from the unit passing through.
///
/// With `new_value` unset the value is the unit's own `param_name`
/// attribute. A `new_value` naming a unit attribute takes that attribute's
/// value; anything else is sent as is.
#[derive(Debug, Default)]
pub struct Reset {
    destination: String,
    param_name: String,
    new_value: Value,
}

impl Reset {
    fn value_for(&self, unit: &Unit, stage: &str) -> Result<Value, DataProcessingError> {
        match &self.new_value {
            Value::Null => unit.attr(&self.param_name).ok_or_else(|| {
                DataProcessingError::new(
                    stage,
                    format!("unit has no '{}' attribute to reset from", self.param_name),
                )
            }),
            Value::String(name) => Ok(unit.attr(name).unwrap_or_else(|| self.new_value.clone())),
            value => Ok(value.clone()),
        }
    }
}

impl Stage for Reset {
    fn accept(&mut self, unit: Unit, link: &Link) -> EngineResult<()> {
        let value = self.value_for(&unit, link.name())?;
        let message = Message::new(
            self.destination.as_str(),
            "reset",
            vec![Value::from(self.param_name.as_str()), value],
        )?;
        link.forward_message(message)?;
        link.forward(unit, Edge::Main)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.destination = params.text("destination")?;
        self.param_name = value_to_text(params.value("param_name")?);
        self.new_value = params.value("new_value")?.clone();
        Ok(())
    }
}
