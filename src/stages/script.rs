// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::fmt;
use std::rc::Rc;

use crate::config::params::ParamTable;
use crate::engine::Link;
use crate::errors::{DataProcessingError, EngineResult, StructuralConfigError};
use crate::observability::messages::stage::StageFailed;
use crate::observability::messages::StructuredLog;
use crate::packet::{Edge, Unit};
use crate::traits::Stage;

/// Body of a script stage. It may change the unit and read the stage's
/// bound parameters; an `Err` becomes a data-processing failure.
pub type ScriptFn = dyn Fn(&mut Unit, &ParamTable) -> Result<(), String>;

/// A stage whose behaviour is a closure registered at runtime through
/// [`crate::config::Registry::register_script`].
pub struct ScriptStage {
    function: Rc<ScriptFn>,
    params: ParamTable,
}

impl ScriptStage {
    pub fn new(function: Rc<ScriptFn>) -> Self {
        Self {
            function,
            params: ParamTable::default(),
        }
    }
}

impl fmt::Debug for ScriptStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptStage")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Stage for ScriptStage {
    fn accept(&mut self, mut unit: Unit, link: &Link) -> EngineResult<()> {
        if let Err(reason) = (self.function)(&mut unit, &self.params) {
            let error = DataProcessingError::new(link.name(), reason);
            StageFailed {
                stage: link.name(),
                error: &error,
            }
            .log();
            return Err(error.into());
        }
        link.forward(unit, Edge::Main)
    }

    fn configure(&mut self, params: &ParamTable) -> Result<(), StructuralConfigError> {
        self.params = params.clone();
        Ok(())
    }
}
