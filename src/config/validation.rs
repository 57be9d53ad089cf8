// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Validation of a loaded pipeline declaration.
//!
//! These checks cover only what can be judged from the declaration alone:
//!
//! 1. **Main block**: `type` non-empty and lower-case, `description` non-empty
//! 2. **Route**: non-empty once comments and whitespace are ignored
//! 3. **Stage sections**: names lower-case
//!
//! Stage types, parameter bindings and route syntax are checked when the
//! graph is assembled, because they need the registry.
//!
//! # Example
//! ```rust
//! use the_filterworks::config::{parse_pipeline_config, validate_pipeline_config, ConfigFormat};
//!
//! let config = parse_pipeline_config(
//!     "main: {type: Demo, description: Mixed case}\nroute: sink",
//!     ConfigFormat::Yaml,
//! )
//! .unwrap();
//!
//! let problems = the_filterworks::config::collect_problems(&config);
//! assert_eq!(problems.len(), 1);
//! assert!(validate_pipeline_config(&config).is_err());
//! ```

use crate::config::PipelineConfig;
use crate::errors::StructuralConfigError;
use crate::observability::messages::validation::{
    ValidationCompleted, ValidationFailed, ValidationStarted,
};
use crate::observability::messages::StructuredLog;

/// Validates a pipeline, returning the first problem found.
pub fn validate_pipeline_config(config: &PipelineConfig) -> Result<(), StructuralConfigError> {
    let pipeline = config.main.type_name.as_str();
    ValidationStarted {
        pipeline,
        stage_count: config.stages.len(),
    }
    .log();

    match collect_problems(config).into_iter().next() {
        None => {
            ValidationCompleted { pipeline }.log();
            Ok(())
        }
        Some(problem) => {
            ValidationFailed {
                pipeline,
                reason: &problem.to_string(),
            }
            .log();
            Err(problem)
        }
    }
}

/// Every problem with the declaration, in the order the checks run.
pub fn collect_problems(config: &PipelineConfig) -> Vec<StructuralConfigError> {
    let mut problems = Vec::new();
    let main = &config.main;

    if main.type_name.trim().is_empty() {
        problems.push(invalid("main.type must not be empty"));
    } else if !is_lower_case(&main.type_name) {
        problems.push(StructuralConfigError::NotLowerCase {
            name: main.type_name.clone(),
        });
    }

    if main.description.trim().is_empty() {
        problems.push(invalid(format!(
            "pipeline '{}' needs a description",
            main.type_name
        )));
    }

    if is_blank_route(&config.route) {
        problems.push(invalid(format!(
            "pipeline '{}' has an empty route",
            main.type_name
        )));
    }

    for name in config.stages.keys() {
        if !is_lower_case(name) {
            problems.push(StructuralConfigError::NotLowerCase { name: name.clone() });
        }
    }

    problems
}

fn invalid(reason: impl Into<String>) -> StructuralConfigError {
    StructuralConfigError::InvalidConfig {
        reason: reason.into(),
    }
}

fn is_lower_case(name: &str) -> bool {
    name == name.to_lowercase()
}

fn is_blank_route(route: &str) -> bool {
    route
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default())
        .all(|line| line.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MainSection, StageSection};
    use std::collections::BTreeMap;

    fn pipeline(type_name: &str, description: &str, route: &str) -> PipelineConfig {
        PipelineConfig {
            main: MainSection {
                type_name: type_name.to_string(),
                description: description.to_string(),
                keys: vec![],
                dynamic: false,
            },
            stages: BTreeMap::new(),
            route: route.to_string(),
        }
    }

    #[test]
    fn test_validate_table_driven() {
        struct TestCase {
            name: &'static str,
            config: PipelineConfig,
            expected_problems: usize,
        }

        let test_cases = vec![
            TestCase {
                name: "valid pipeline",
                config: pipeline("reverser", "Reverse text", "reverse_string"),
                expected_problems: 0,
            },
            TestCase {
                name: "upper-case type",
                config: pipeline("Reverser", "Reverse text", "reverse_string"),
                expected_problems: 1,
            },
            TestCase {
                name: "empty type",
                config: pipeline("  ", "Reverse text", "reverse_string"),
                expected_problems: 1,
            },
            TestCase {
                name: "missing description",
                config: pipeline("reverser", "", "reverse_string"),
                expected_problems: 1,
            },
            TestCase {
                name: "route is only a comment",
                config: pipeline("reverser", "Reverse text", "# nothing here\n   \n"),
                expected_problems: 1,
            },
            TestCase {
                name: "everything wrong",
                config: pipeline("X", "", ""),
                expected_problems: 3,
            },
        ];

        for case in test_cases {
            let problems = collect_problems(&case.config);
            assert_eq!(
                problems.len(),
                case.expected_problems,
                "case '{}': {:?}",
                case.name,
                problems
            );
            assert_eq!(
                validate_pipeline_config(&case.config).is_ok(),
                case.expected_problems == 0,
                "case '{}'",
                case.name
            );
        }
    }

    #[test]
    fn test_stage_section_names_must_be_lower_case() {
        let mut config = pipeline("reverser", "Reverse text", "reverse_string");
        config
            .stages
            .insert("Reverse_String".to_string(), StageSection::default());

        let err = validate_pipeline_config(&config).unwrap_err();
        assert!(matches!(
            err,
            StructuralConfigError::NotLowerCase { ref name } if name == "Reverse_String"
        ));
    }
}
