// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::StructuralConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// A pipeline declaration: the graph's own description, per-stage parameter
/// overrides and the route that connects the stages.
///
/// # Example
/// ```yaml
/// main:
///   type: factorial
///   description: Recursive factorial
///   keys: [start:1]
///   dynamic: false
/// stages:
///   branch_if:
///     compare_value: true
/// route: |
///   tank_queue:0 factorial_calc branch_if:recurse (tank_feed tank_queue) sink
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub main: MainSection,
    #[serde(default)]
    pub stages: BTreeMap<String, StageSection>,
    pub route: String,
}

/// The `main:` block.
///
/// # Fields
/// * `type_name` - the graph's own type name, used when it is nested in another graph
/// * `description` - required, non-empty
/// * `keys` - the graph's declared parameters, `name` or `name:default`
/// * `dynamic` - when true, `%UPPER_NAME` values become environment references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainSection {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub keys: Vec<String>,
    #[serde(default)]
    pub dynamic: bool,
}

/// One entry under `stages:`. Everything except `type` is a parameter override.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageSection {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(flatten)]
    pub params: BTreeMap<String, serde_yaml::Value>,
}

/// A library of reusable pipelines plus the shared essentials pool.
///
/// # Example
/// ```yaml
/// essentials:
///   branch_key: recurse
/// pipelines:
///   - main: {type: reverser, description: Reverse twice}
///     route: reverse_string reverse_string_2
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    #[serde(default)]
    pub essentials: BTreeMap<String, serde_yaml::Value>,
    #[serde(default)]
    pub pipelines: Vec<PipelineConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// `.toml` files are TOML; anything else is YAML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

fn parse<T: for<'de> Deserialize<'de>>(
    text: &str,
    format: ConfigFormat,
    origin: &str,
) -> Result<T, StructuralConfigError> {
    let parsed = match format {
        ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(text).map_err(|e| e.to_string()),
    };
    parsed.map_err(|reason| StructuralConfigError::Parse {
        path: origin.to_string(),
        reason,
    })
}

fn read<P: AsRef<Path>>(path: P) -> Result<String, StructuralConfigError> {
    fs::read_to_string(path.as_ref()).map_err(|source| StructuralConfigError::Io {
        path: path.as_ref().display().to_string(),
        source,
    })
}

pub fn parse_pipeline_config(
    text: &str,
    format: ConfigFormat,
) -> Result<PipelineConfig, StructuralConfigError> {
    parse(text, format, "<inline>")
}

pub fn parse_library(text: &str, format: ConfigFormat) -> Result<LibraryConfig, StructuralConfigError> {
    parse(text, format, "<inline>")
}

/// Load a pipeline from a YAML or TOML file
pub fn load_pipeline_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, StructuralConfigError> {
    let text = read(&path)?;
    parse(
        &text,
        ConfigFormat::from_path(&path),
        &path.as_ref().display().to_string(),
    )
}

/// Load and validate a pipeline
///
/// Validation covers the declaration itself (names, description, route).
/// Stage types and parameters are checked when the graph is built.
pub fn load_and_validate_pipeline_config<P: AsRef<Path>>(
    path: P,
) -> Result<PipelineConfig, StructuralConfigError> {
    let config = load_pipeline_config(path)?;
    crate::config::validate_pipeline_config(&config)?;
    Ok(config)
}

/// Load a pipeline library and validate every pipeline in it
pub fn load_library<P: AsRef<Path>>(path: P) -> Result<LibraryConfig, StructuralConfigError> {
    let text = read(&path)?;
    let library: LibraryConfig = parse(
        &text,
        ConfigFormat::from_path(&path),
        &path.as_ref().display().to_string(),
    )?;
    for pipeline in &library.pipelines {
        crate::config::validate_pipeline_config(pipeline)?;
    }
    Ok(library)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_pipeline() {
        let yaml = r#"
main:
  type: factorial
  description: Recursive factorial
  keys: [start:1]
stages:
  branch_if:
    type: branch_if
    compare_value: true
route: |
  tank_queue:0 factorial_calc branch_if:recurse (tank_feed tank_queue) sink
"#;

        let cfg = parse_pipeline_config(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(cfg.main.type_name, "factorial");
        assert_eq!(cfg.main.keys, vec!["start:1"]);
        assert!(!cfg.main.dynamic);

        let section = &cfg.stages["branch_if"];
        assert_eq!(section.type_name.as_deref(), Some("branch_if"));
        assert_eq!(
            section.params.get("compare_value"),
            Some(&serde_yaml::Value::Bool(true))
        );
        assert!(!section.params.contains_key("type"));
    }

    #[test]
    fn parse_toml_pipeline() {
        let toml_text = r#"
route = "read_source (sink) reverse_string"

[main]
type = "reverser"
description = "Reverse with a copy"

[stages.reverse_string]
type = "reverse_string"
"#;

        let cfg = parse_pipeline_config(toml_text, ConfigFormat::Toml).unwrap();
        assert_eq!(cfg.main.type_name, "reverser");
        assert_eq!(cfg.route, "read_source (sink) reverse_string");
        assert_eq!(
            cfg.stages["reverse_string"].type_name.as_deref(),
            Some("reverse_string")
        );
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(ConfigFormat::from_path("p.toml"), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("p.TOML"), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path("p.yaml"), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path("pipeline"), ConfigFormat::Yaml);
    }

    #[test]
    fn missing_route_is_a_parse_error() {
        let err = parse_pipeline_config("main: {type: x, description: y}", ConfigFormat::Yaml)
            .unwrap_err();
        assert!(matches!(err, StructuralConfigError::Parse { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = load_pipeline_config("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, StructuralConfigError::Io { .. }));
    }

    #[test]
    fn parse_library_with_essentials() {
        let yaml = r#"
essentials:
  branch_key: recurse
pipelines:
  - main: {type: reverser, description: Reverse twice}
    route: reverse_string reverse_string_2
"#;
        let library = parse_library(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(library.pipelines.len(), 1);
        assert_eq!(
            library.essentials.get("branch_key"),
            Some(&serde_yaml::Value::String("recurse".into()))
        );
    }
}
