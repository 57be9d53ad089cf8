// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The type registry consulted during graph assembly.
//!
//! A [`Registry`] holds three things:
//! * stage descriptors, keyed by type name, each with a flat parameter set
//!   merged from its base behaviours once at registration
//! * sub-graph declarations, so a pipeline can use another pipeline as a stage
//! * the shared essentials pool, consulted for essential parameters left
//!   unbound by the route and the stage sections

use crate::config::literal::from_yaml;
use crate::config::params::{Behavior, ParamSet, ParamSpec, ParamTable};
use crate::config::{validate_pipeline_config, LibraryConfig, PipelineConfig};
use crate::errors::StructuralConfigError;
use crate::packet::Unit;
use crate::stages::builtin::builtin_descriptors;
use crate::stages::script::{ScriptFn, ScriptStage};
use crate::traits::Stage;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

type Constructor = Rc<dyn Fn() -> Box<dyn Stage>>;

/// Everything assembly needs to know about a stage type.
#[derive(Clone)]
pub struct StageDescriptor {
    pub type_name: String,
    pub description: String,
    /// Own keys merged over every base behaviour's keys.
    pub params: ParamSet,
    /// Names from `keys` as given, repeats included.
    own_keys: Vec<String>,
    constructor: Constructor,
}

impl StageDescriptor {
    /// Describes a stage type.
    ///
    /// `bases` are merged first, in order, then `keys`; for a parameter that
    /// appears more than once the most specific default wins.
    ///
    /// # Example
    /// ```
    /// use the_filterworks::config::params::Behavior;
    /// use the_filterworks::config::StageDescriptor;
    /// use the_filterworks::stages::pass_through::PassThrough;
    /// use serde_json::Value;
    ///
    /// const LIMITED: Behavior = Behavior { name: "limited", keys: &["limit:10"] };
    ///
    /// let descriptor = StageDescriptor::new(
    ///     "capped",
    ///     "Pass units through, with a limit",
    ///     &[LIMITED],
    ///     &["label", "limit:3"],
    ///     || Box::new(PassThrough),
    /// );
    /// assert_eq!(descriptor.params.names(), vec!["limit", "label"]);
    /// assert_eq!(descriptor.params.get("limit").unwrap().default, Some(Value::from(3)));
    /// ```
    pub fn new<F>(
        type_name: &str,
        description: &str,
        bases: &[Behavior],
        keys: &[&str],
        constructor: F,
    ) -> Self
    where
        F: Fn() -> Box<dyn Stage> + 'static,
    {
        let mut params = ParamSet::new();
        for base in bases {
            params.merge(&base.params());
        }
        params.merge(&ParamSet::parse(keys));
        let own_keys = keys
            .iter()
            .map(|key| ParamSpec::parse(key).name)
            .collect();
        Self {
            type_name: type_name.to_string(),
            description: description.to_string(),
            params,
            own_keys,
            constructor: Rc::new(constructor),
        }
    }

    pub fn instantiate(&self) -> Box<dyn Stage> {
        (self.constructor)()
    }
}

impl fmt::Debug for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDescriptor")
            .field("type_name", &self.type_name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Stage types, sub-graphs and the essentials pool.
///
/// # Example
/// ```
/// use the_filterworks::config::Registry;
///
/// let registry = Registry::with_builtins();
/// assert!(registry.stage("tank_queue").is_some());
/// assert!(registry.type_names().contains(&"branch_if"));
/// ```
#[derive(Debug, Default)]
pub struct Registry {
    stages: BTreeMap<String, StageDescriptor>,
    graphs: BTreeMap<String, PipelineConfig>,
    essentials: BTreeMap<String, Value>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in stage type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin_descriptors() {
            registry
                .stages
                .insert(descriptor.type_name.clone(), descriptor);
        }
        registry
    }

    pub fn register(&mut self, descriptor: StageDescriptor) -> Result<(), StructuralConfigError> {
        check_type_name(&descriptor.type_name)?;
        check_param_names(&descriptor)?;
        if self.stages.contains_key(&descriptor.type_name) {
            return Err(StructuralConfigError::DuplicateType {
                type_name: descriptor.type_name,
            });
        }
        self.stages
            .insert(descriptor.type_name.clone(), descriptor);
        Ok(())
    }

    /// Registers a stage type whose step is `function`. The stage calls it
    /// with each unit and its bound parameters, then forwards the unit. An
    /// `Err` stops the unit with a data processing error.
    ///
    /// # Example
    /// ```
    /// use the_filterworks::config::Registry;
    ///
    /// let mut registry = Registry::with_builtins();
    /// registry
    ///     .register_script("shout", &["suffix:!"], |unit, params| {
    ///         let suffix = params.text("suffix").map_err(|e| e.to_string())?;
    ///         unit.set_data(format!("{}{}", unit.text().to_uppercase(), suffix));
    ///         Ok(())
    ///     })
    ///     .unwrap();
    /// assert!(registry.stage("shout").is_some());
    /// ```
    pub fn register_script<F>(
        &mut self,
        type_name: &str,
        keys: &[&str],
        function: F,
    ) -> Result<(), StructuralConfigError>
    where
        F: Fn(&mut Unit, &ParamTable) -> Result<(), String> + 'static,
    {
        let function: Rc<ScriptFn> = Rc::new(function);
        let description = format!("Script stage '{}'", type_name);
        self.register(StageDescriptor::new(
            type_name,
            &description,
            &[],
            keys,
            move || Box::new(ScriptStage::new(Rc::clone(&function))),
        ))
    }

    /// Registers a pipeline as a sub-graph type named by its `main.type`.
    pub fn register_graph(&mut self, config: PipelineConfig) -> Result<(), StructuralConfigError> {
        validate_pipeline_config(&config)?;
        let type_name = config.main.type_name.clone();
        if self.graphs.contains_key(&type_name) {
            return Err(StructuralConfigError::DuplicateType { type_name });
        }
        self.graphs.insert(type_name, config);
        Ok(())
    }

    /// Registers every pipeline of a library and adds its essentials to the pool.
    pub fn register_library(&mut self, library: LibraryConfig) -> Result<(), StructuralConfigError> {
        for (name, value) in &library.essentials {
            self.set_essential(name, from_yaml(value));
        }
        for pipeline in library.pipelines {
            self.register_graph(pipeline)?;
        }
        Ok(())
    }

    pub fn set_essential(&mut self, name: &str, value: impl Into<Value>) {
        self.essentials.insert(name.to_string(), value.into());
    }

    pub fn essential(&self, name: &str) -> Option<&Value> {
        self.essentials.get(name)
    }

    pub fn stage(&self, type_name: &str) -> Option<&StageDescriptor> {
        self.stages.get(type_name)
    }

    pub fn graph(&self, type_name: &str) -> Option<&PipelineConfig> {
        self.graphs.get(type_name)
    }

    /// Registered stage type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        self.stages.keys().map(String::as_str).collect()
    }

    pub fn graph_names(&self) -> Vec<&str> {
        self.graphs.keys().map(String::as_str).collect()
    }
}

fn check_type_name(type_name: &str) -> Result<(), StructuralConfigError> {
    if type_name.trim().is_empty() {
        return Err(StructuralConfigError::InvalidConfig {
            reason: "stage type name must not be empty".to_string(),
        });
    }
    if type_name != type_name.to_lowercase() {
        return Err(StructuralConfigError::NotLowerCase {
            name: type_name.to_string(),
        });
    }
    Ok(())
}

/// Declared names must be lower-case, and a type may not list the same
/// key twice in its own keys. Overriding a base behaviour's key is fine.
fn check_param_names(descriptor: &StageDescriptor) -> Result<(), StructuralConfigError> {
    if let Some(name) = descriptor
        .params
        .names()
        .into_iter()
        .find(|name| *name != name.to_lowercase())
    {
        return Err(StructuralConfigError::NotLowerCase {
            name: format!("{}.{}", descriptor.type_name, name),
        });
    }
    for (index, name) in descriptor.own_keys.iter().enumerate() {
        if descriptor.own_keys[..index].contains(name) {
            return Err(StructuralConfigError::DuplicateParameter {
                stage: descriptor.type_name.clone(),
                parameter: name.clone(),
            });
        }
    }
    Ok(())
}
