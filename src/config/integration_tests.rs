// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use crate::config::{
        load_and_validate_pipeline_config, load_library, load_pipeline_config, RuntimeBuilder,
    };
    use crate::errors::{EngineError, StructuralConfigError};
    use crate::packet::Unit;
    use serde_json::Value;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const FACTORIAL_YAML: &str = r#"
main:
  type: factorial
  description: Iterative factorial
  keys: ["size:0"]
stages:
  branch_if:
    comparison: equals
    compare_value: true
route: |
  # feedback through the tank keeps the stack flat
  tank_queue:${size} factorial_calc branch_if:recurse (tank_feed tank_queue) sink
"#;

    const FACTORIAL_TOML: &str = r#"
route = "tank_queue:0 factorial_calc branch_if:recurse (tank_feed tank_queue) sink"

[main]
type = "factorial"
description = "Iterative factorial"

[stages.branch_if]
compare_value = true
"#;

    /// YAML and TOML declarations of the same pipeline load to the same thing
    #[test]
    fn test_yaml_and_toml_agree() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = load_pipeline_config(write(&dir, "factorial.yaml", FACTORIAL_YAML)).unwrap();
        let toml = load_pipeline_config(write(&dir, "factorial.toml", FACTORIAL_TOML)).unwrap();

        assert_eq!(yaml.main.type_name, toml.main.type_name);
        assert_eq!(yaml.stages.keys().collect::<Vec<_>>(), vec!["branch_if"]);
        assert_eq!(toml.stages.keys().collect::<Vec<_>>(), vec!["branch_if"]);
        assert!(toml.route.contains("tank_feed tank_queue"));
    }

    /// A pipeline file runs end to end through the runtime builder
    #[test]
    fn test_runtime_builder_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "factorial.yaml", FACTORIAL_YAML);

        let mut graph = RuntimeBuilder::from_path(&path)
            .unwrap()
            .param("size", 0)
            .build()
            .unwrap();
        let results = graph.pump_data(vec![Unit::new().with_attr("x", 5)]).unwrap();

        assert_eq!(results[0].attr("x_factorial"), Some(Value::from(120)));
        graph.shutdown().unwrap();
    }

    /// A TOML pipeline builds just like a YAML one
    #[test]
    fn test_runtime_builder_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "factorial.toml", FACTORIAL_TOML);

        let mut graph = RuntimeBuilder::from_path(&path).unwrap().build().unwrap();
        let results = graph.pump_data(vec![Unit::new().with_attr("x", 4)]).unwrap();
        assert_eq!(results[0].attr("x_factorial"), Some(Value::from(24)));
    }

    /// Sub-graphs and essentials come from a library file
    #[test]
    fn test_library_supplies_sub_graphs_and_essentials() {
        let dir = tempfile::tempdir().unwrap();
        let library = write(
            &dir,
            "library.yaml",
            r#"
essentials:
  mark: "*"
pipelines:
  - main: {type: marker, description: Marks text, keys: [mark]}
    route: wrap:${mark}:${mark}
"#,
        );
        let pipeline = write(
            &dir,
            "outer.yaml",
            "main: {type: outer, description: Reverse then mark}\nroute: reverse_string marker\n",
        );

        let loaded = load_library(&library).unwrap();
        assert_eq!(loaded.pipelines.len(), 1);

        let mut graph = RuntimeBuilder::from_path(&pipeline)
            .unwrap()
            .library(&library)
            .unwrap()
            .build()
            .unwrap();
        let results = graph.pump_data(vec![Unit::from_text("ab")]).unwrap();
        assert_eq!(results[0].text(), "*ba*");
    }

    /// Structural problems in a file are reported before anything is built
    #[test]
    fn test_invalid_files_are_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let upper = write(
            &dir,
            "upper.yaml",
            "main: {type: Loud, description: Upper-case type}\nroute: wrap\n",
        );
        let err = load_and_validate_pipeline_config(&upper).unwrap_err();
        assert!(matches!(err, StructuralConfigError::NotLowerCase { .. }));

        let blank = write(
            &dir,
            "blank.yaml",
            "main: {type: blank, description: Blank route}\nroute: \"  # nothing here\"\n",
        );
        let err = load_and_validate_pipeline_config(&blank).unwrap_err();
        assert!(matches!(err, StructuralConfigError::InvalidConfig { .. }));

        let garbled = write(&dir, "garbled.toml", "route = [unterminated");
        let err = load_pipeline_config(&garbled).unwrap_err();
        assert!(matches!(err, StructuralConfigError::Parse { .. }));

        let err = RuntimeBuilder::from_path(dir.path().join("missing.yaml")).err().unwrap();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::Io { .. })
        ));
    }

    /// Undeclared stage parameters in a file fail the build
    #[test]
    fn test_undeclared_section_parameter_fails_build() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "typo.yaml",
            "main: {type: typo, description: Typo}\nstages:\n  wrap: {data_sufix: x}\nroute: wrap\n",
        );
        let err = RuntimeBuilder::from_path(&path).unwrap().build().err().unwrap();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::UndeclaredParameter { .. })
        ));
    }
}
