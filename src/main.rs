// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use the_filterworks::config::literal::convert_literal;
use the_filterworks::config::params::Environment;
use the_filterworks::config::{
    parse_library, parse_pipeline_config, validate_pipeline_config, ConfigFormat, LibraryConfig,
    PipelineConfig, Registry, RuntimeBuilder,
};
use the_filterworks::packet::Unit;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "Usage: filterworks <pipeline.yaml|toml> [--library lib.yaml] [--set k=v]... [--attr k=v]... [input ...]";

/// Parsed command line
#[derive(Debug, Default)]
struct Invocation {
    pipeline: PathBuf,
    library: Option<PathBuf>,
    params: Vec<(String, Value)>,
    attrs: Vec<(String, Value)>,
    inputs: Vec<String>,
}

fn key_value(flag: &str, text: Option<String>) -> Result<(String, Value)> {
    let text = text.with_context(|| format!("{} needs a k=v argument", flag))?;
    let Some((key, value)) = text.split_once('=') else {
        bail!("{} expects k=v, got '{}'", flag, text);
    };
    Ok((key.trim().to_string(), convert_literal(value.trim())))
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Invocation> {
    let mut args = args.into_iter();
    let mut invocation = Invocation::default();
    let mut pipeline = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--library" => {
                let path = args.next().context("--library needs a path")?;
                invocation.library = Some(PathBuf::from(path));
            }
            "--set" => invocation.params.push(key_value("--set", args.next())?),
            "--attr" => invocation.attrs.push(key_value("--attr", args.next())?),
            "-h" | "--help" => bail!(USAGE),
            _ if pipeline.is_none() => pipeline = Some(PathBuf::from(arg)),
            _ => invocation.inputs.push(arg),
        }
    }

    invocation.pipeline = pipeline.context(USAGE)?;
    Ok(invocation)
}

async fn read_pipeline(path: &PathBuf) -> Result<PipelineConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read pipeline '{}'", path.display()))?;
    let config = parse_pipeline_config(&text, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse pipeline '{}'", path.display()))?;
    validate_pipeline_config(&config)
        .with_context(|| format!("Invalid pipeline '{}'", path.display()))?;
    Ok(config)
}

async fn read_library(path: &PathBuf) -> Result<LibraryConfig> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read library '{}'", path.display()))?;
    parse_library(&text, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse library '{}'", path.display()))
}

/// Builds the graph, pumps every input through it and shuts it down.
///
/// Graphs are single-threaded, so this runs on a blocking task and hands back
/// rendered lines rather than units.
fn run(
    config: PipelineConfig,
    library: Option<LibraryConfig>,
    invocation: Invocation,
) -> Result<Vec<String>> {
    let mut registry = Registry::with_builtins();
    if let Some(library) = library {
        registry
            .register_library(library)
            .context("Failed to register library")?;
    }

    let mut builder = RuntimeBuilder::new(config)
        .registry(registry)
        .environment(Environment::from_process());
    for (key, value) in invocation.params {
        builder = builder.param(&key, value);
    }
    let mut graph = builder.build().context("Failed to build graph")?;

    let inputs = if invocation.inputs.is_empty() {
        vec![String::new()]
    } else {
        invocation.inputs
    };
    let units = inputs
        .iter()
        .map(|input| {
            let unit = Unit::from_text(input);
            for (key, value) in &invocation.attrs {
                unit.set_attr(key, value.clone());
            }
            unit
        })
        .collect();

    let pumped = graph.pump_data(units);
    let shutdown = graph.shutdown();
    let results = pumped.context("Pipeline failed")?;
    shutdown.context("Shutdown failed")?;

    results
        .iter()
        .map(|unit| -> Result<String> {
            let attrs = serde_json::to_string(&unit.attrs())?;
            Ok(format!("{}\t{}", unit.text(), attrs))
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let invocation = parse_args(env::args().skip(1))?;
    let config = read_pipeline(&invocation.pipeline).await?;
    let library = match &invocation.library {
        Some(path) => Some(read_library(path).await?),
        None => None,
    };

    let lines = tokio::task::spawn_blocking(move || run(config, library, invocation))
        .await
        .context("Pipeline task panicked")??;

    for line in lines {
        println!("{}", line);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_args() {
        let invocation = parse_args(args(&[
            "demos/factorial.yaml",
            "--set",
            "start=5",
            "--attr",
            "x=5",
            "--library",
            "lib.yaml",
            "one",
            "two",
        ]))
        .unwrap();
        assert_eq!(invocation.pipeline, PathBuf::from("demos/factorial.yaml"));
        assert_eq!(invocation.library, Some(PathBuf::from("lib.yaml")));
        assert_eq!(invocation.params, vec![("start".to_string(), Value::from(5))]);
        assert_eq!(invocation.attrs, vec![("x".to_string(), Value::from(5))]);
        assert_eq!(invocation.inputs, vec!["one", "two"]);
    }

    #[test]
    fn test_parse_args_rejects_bad_pairs() {
        assert!(parse_args(args(&["p.yaml", "--set", "novalue"])).is_err());
        assert!(parse_args(args(&["p.yaml", "--attr"])).is_err());
        assert!(parse_args(args(&[])).is_err());
    }

    #[tokio::test]
    async fn test_read_pipeline_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reverse.yaml");
        tokio::fs::write(
            &path,
            "main: {type: reverse_twice, description: Reverse twice}\nroute: reverse_string reverse_string_2\n",
        )
        .await
        .unwrap();

        let config = read_pipeline(&path).await.unwrap();
        let lines = run(
            config,
            None,
            Invocation {
                pipeline: path,
                inputs: vec!["abc".to_string()],
                ..Invocation::default()
            },
        )
        .unwrap();
        assert_eq!(lines, vec!["abc\t{}"]);
    }
}
