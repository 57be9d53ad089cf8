// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::Environment;
use crate::config::{load_and_validate_pipeline_config, load_library, PipelineConfig, Registry};
use crate::engine::{Graph, GraphBuilder};
use crate::errors::EngineResult;
use serde_json::Value;
use std::path::Path;

/// Pipeline runtime builder - gathers a pipeline, its libraries and its
/// top-level parameters, then assembles the live graph.
///
/// The `RuntimeBuilder` is the one-stop interface used by the CLI. It starts
/// from the built-in registry, layers any libraries on top and hands
/// everything to [`GraphBuilder`].
///
/// # Examples
///
/// ## Building a graph from an in-memory pipeline
/// ```
/// use the_filterworks::config::{parse_pipeline_config, ConfigFormat, RuntimeBuilder};
/// use the_filterworks::packet::Unit;
///
/// let config = parse_pipeline_config(
///     "main: {type: shouty, description: Wrap text, keys: ['suffix:!']}\nroute: wrap::${suffix}",
///     ConfigFormat::Yaml,
/// )
/// .unwrap();
///
/// let mut graph = RuntimeBuilder::new(config).build().unwrap();
/// let results = graph.pump_data(vec![Unit::from_text("hi")]).unwrap();
/// assert_eq!(results[0].text(), "hi!");
/// ```
pub struct RuntimeBuilder {
    config: PipelineConfig,
    registry: Registry,
    params: Vec<(String, Value)>,
    environment: Option<Environment>,
}

impl RuntimeBuilder {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            registry: Registry::with_builtins(),
            params: Vec::new(),
            environment: None,
        }
    }

    /// Load and validate a pipeline file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        Ok(Self::new(load_and_validate_pipeline_config(path)?))
    }

    /// Replace the registry. Built-in stages are only present if the given
    /// registry has them.
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// Load a library file and register its pipelines and essentials.
    pub fn library<P: AsRef<Path>>(mut self, path: P) -> EngineResult<Self> {
        let library = load_library(path)?;
        self.registry.register_library(library)?;
        Ok(self)
    }

    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Assemble the graph.
    pub fn build(self) -> EngineResult<Graph> {
        let mut builder = GraphBuilder::new(&self.config, &self.registry);
        for (key, value) in self.params {
            builder = builder.param(&key, value);
        }
        if let Some(environment) = self.environment {
            builder = builder.environment(environment);
        }
        builder.build()
    }
}
