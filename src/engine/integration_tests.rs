// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::params::Environment;
use crate::config::{parse_pipeline_config, ConfigFormat, Registry};
use crate::engine::{Graph, GraphBuilder, StageState};
use crate::errors::{EngineError, EngineResult, RoutingError, StructuralConfigError};
use crate::packet::{Message, Unit};
use crate::stages::sink::Sink;
use crate::stages::stub::stub_registry;
use crate::stages::tank_queue::TankQueue;

/// Integration tests that assemble real graphs from YAML and push units through them
#[cfg(test)]
mod tests {
    use super::*;

    fn build_with(yaml: &str, registry: &Registry) -> EngineResult<Graph> {
        let config = parse_pipeline_config(yaml, ConfigFormat::Yaml)?;
        GraphBuilder::new(&config, registry).build()
    }

    fn build(yaml: &str) -> EngineResult<Graph> {
        build_with(yaml, &Registry::with_builtins())
    }

    fn texts(units: &[Unit]) -> Vec<String> {
        units.iter().map(Unit::text).collect()
    }

    const READ_WRITE_REVERSE: &str = r#"
main: {type: read_write_reverse, description: Copy aside then reverse}
stages:
  read: {type: branch_clone}
  write: {type: sink, max_results: 0}
  reverse: {type: reverse_string}
route: read (write) reverse
"#;

    const FACTORIAL: &str = r#"
main: {type: factorial, description: Iterative factorial}
route: |
  tank_queue:0 factorial_calc branch_if:recurse (tank_feed tank_queue) sink
"#;

    #[test]
    fn test_read_write_reverse() {
        let mut graph = build(READ_WRITE_REVERSE).unwrap();

        let results = graph
            .pump_data(vec![Unit::from_text("hello"), Unit::from_text("world")])
            .unwrap();

        assert_eq!(texts(&results), vec!["olleh", "dlrow"]);
        let written = graph.inspect::<Sink, _>("write", Sink::all_text).unwrap();
        assert_eq!(written, vec!["hello", "world"]);
        graph.shutdown().unwrap();
    }

    #[test]
    fn test_branch_ref_shares_the_unit() {
        let yaml = READ_WRITE_REVERSE.replace("branch_clone", "branch_ref");
        let mut graph = build(&yaml).unwrap();

        graph.pump_data(vec![Unit::from_text("hello")]).unwrap();

        // The branch kept the same unit main went on to reverse.
        let written = graph.inspect::<Sink, _>("write", Sink::all_text).unwrap();
        assert_eq!(written, vec!["olleh"]);
    }

    #[test]
    fn test_branch_runs_before_main() {
        let (registry, journal) = stub_registry();
        let graph = build_with(
            "main: {type: order, description: Branch ordering}\nroute: branch_clone (stub_b) stub_m",
            &registry,
        )
        .unwrap();

        graph.send(Unit::from_text("x")).unwrap();
        graph
            .send_message(Message::parse("nobody", "ping").unwrap())
            .unwrap();

        assert_eq!(
            *journal.borrow(),
            vec!["stub_b:x", "stub_m:x", "!ping", "!ping"]
        );
    }

    #[test]
    fn test_factorial_of_five() {
        let mut graph = build(FACTORIAL).unwrap();

        let results = graph
            .pump_data(vec![Unit::new().with_attr("x", 5)])
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].attr("x_factorial"), Some(120.into()));
        assert_eq!(results[0].attr("recurse"), Some(false.into()));
        let cycles = graph
            .inspect::<TankQueue, _>("tank_queue", TankQueue::forwarded)
            .unwrap();
        assert_eq!(cycles, 5);

        let results = graph
            .pump_data(vec![Unit::new().with_attr("x", 3)])
            .unwrap();
        assert_eq!(results[0].attr("x_factorial"), Some(6.into()));
        graph.shutdown().unwrap();
    }

    #[test]
    fn test_factorial_of_zero_and_negative() {
        let mut graph = build(FACTORIAL).unwrap();
        let results = graph
            .pump_data(vec![Unit::new().with_attr("x", 0)])
            .unwrap();
        assert_eq!(results[0].attr("x_factorial"), Some(1.into()));
        assert_eq!(results[0].attr("recurse"), Some(false.into()));

        let err = graph
            .pump_data(vec![Unit::new().with_attr("x", -1)])
            .unwrap_err();
        assert!(matches!(err, EngineError::DataProcessing(_)));
    }

    #[test]
    fn test_tank_orders_by_priority_and_resizes() {
        let graph = build("main: {type: tank_demo, description: Tank ordering}\nroute: tank_queue:3 sink").unwrap();

        for seq in [6, 5, -1] {
            let unit = Unit::from_text(&seq.to_string());
            unit.set_seq_num(seq);
            graph.send(unit).unwrap();
        }
        assert_eq!(graph.inspect::<TankQueue, _>("tank_queue", TankQueue::held).unwrap(), 3);
        assert!(graph.inspect::<Sink, _>("sink", Sink::is_empty).unwrap());

        graph
            .send_message(Message::parse("tank_queue", "reset:tank_size:1").unwrap())
            .unwrap();
        assert_eq!(graph.inspect::<Sink, _>("sink", Sink::all_text).unwrap(), vec!["-1", "5"]);
        assert_eq!(graph.param("tank_queue", "tank_size"), Some(1.into()));

        // Growing again only adds placeholders.
        graph
            .send_message(Message::parse("tank_queue", "reset:tank_size:3").unwrap())
            .unwrap();
        let (held, len) = graph
            .inspect::<TankQueue, _>("tank_queue", |t| (t.held(), t.len()))
            .unwrap();
        assert_eq!((held, len), (1, 3));
        assert_eq!(graph.inspect::<Sink, _>("sink", Sink::len).unwrap(), 2);

        graph.shutdown().unwrap();
        assert_eq!(
            graph.inspect::<Sink, _>("sink", Sink::all_text).unwrap(),
            vec!["-1", "5", "6"]
        );
    }

    #[test]
    fn test_reset_stage_drives_a_parameter() {
        let mut graph = build(
            r#"
main: {type: resetter, description: Suffix taken from the unit}
stages:
  reset: {destination: wrap, param_name: data_suffix}
route: reset wrap
"#,
        )
        .unwrap();

        let results = graph
            .pump_data(vec![
                Unit::from_text("hi").with_attr("data_suffix", "!"),
                Unit::from_text("hi").with_attr("data_suffix", "?"),
            ])
            .unwrap();

        assert_eq!(texts(&results), vec!["hi!", "hi?"]);
        assert_eq!(graph.param("wrap", "data_suffix"), Some("?".into()));
    }

    fn broadcast(single_use: bool) -> Graph {
        let yaml = r#"
main: {type: broadcast, description: Suffix every wrap}
stages:
  send_message:
    destination: wrap
    message: "reset:data_suffix:!"
    single_use: SINGLE_USE
  sink: {capture_msgs: true}
route: send_message wrap wrap_2 sink
"#
        .replace("SINGLE_USE", &single_use.to_string());
        build(&yaml).unwrap()
    }

    #[test]
    fn test_message_reaches_every_stage_of_a_type_unless_single_use() {
        let mut graph = broadcast(false);
        let results = graph.pump_data(vec![Unit::from_text("hi")]).unwrap();
        assert_eq!(texts(&results), vec!["hi!!"]);
        let seen = graph.inspect::<Sink, _>("sink", |s| s.messages().len()).unwrap();
        assert_eq!(seen, 1);

        let mut graph = broadcast(true);
        let results = graph.pump_data(vec![Unit::from_text("hi")]).unwrap();
        assert_eq!(texts(&results), vec!["hi!"]);
        let seen = graph.inspect::<Sink, _>("sink", |s| s.messages().len()).unwrap();
        assert_eq!(seen, 0);
    }

    #[test]
    fn test_message_errors() {
        let graph = build("main: {type: plain, description: Plain}\nroute: wrap").unwrap();

        let err = graph
            .send_message(Message::parse("wrap", "explode").unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Message(_)));

        let err = graph
            .send_message(Message::parse("wrap", "reset:no_such_param:1").unwrap())
            .unwrap_err();
        assert!(matches!(err, EngineError::Message(_)));
    }

    #[test]
    fn test_seq_packet_counter_resets() {
        let graph = build("main: {type: numbered, description: Numbering}\nroute: seq_packet sink").unwrap();

        for _ in 0..3 {
            graph.send(Unit::new()).unwrap();
        }
        graph
            .send_message(Message::parse("seq_packet", "reset_counter").unwrap())
            .unwrap();
        graph.send(Unit::new()).unwrap();

        let numbers = graph
            .inspect::<Sink, _>("sink", |s| s.results().map(Unit::seq_num).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(numbers, vec![Some(0), Some(1), Some(2), Some(0)]);
    }

    #[test]
    fn test_dynamic_parameters_follow_the_environment() {
        let yaml = r#"
main: {type: dynamic_wrap, description: Suffix from the environment, dynamic: true}
stages:
  wrap: {data_suffix: "%SUFFIX"}
route: wrap
"#;
        let config = parse_pipeline_config(yaml, ConfigFormat::Yaml).unwrap();
        let registry = Registry::with_builtins();

        let err = GraphBuilder::new(&config, &registry).build().unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::UnresolvedEnvironment { .. })
        ));

        let environment: Environment = [("SUFFIX", "!")].into_iter().collect();
        let mut graph = GraphBuilder::new(&config, &registry)
            .environment(environment)
            .build()
            .unwrap();

        let results = graph.pump_data(vec![Unit::from_text("a")]).unwrap();
        assert_eq!(texts(&results), vec!["a!"]);

        graph.environment().set("SUFFIX", "?");
        let results = graph.pump_data(vec![Unit::from_text("a")]).unwrap();
        assert_eq!(texts(&results), vec!["a?"]);

        graph.environment().remove("SUFFIX");
        let err = graph.pump_data(vec![Unit::from_text("a")]).unwrap_err();
        assert!(matches!(err, EngineError::DataProcessing(_)));
    }

    #[test]
    fn test_sub_graph_substitution_and_dotted_paths() {
        let mut registry = Registry::with_builtins();
        registry
            .register_graph(
                parse_pipeline_config(
                    "main: {type: suffixer, description: Adds a mark, keys: [mark]}\nroute: wrap::${mark}",
                    ConfigFormat::Yaml,
                )
                .unwrap(),
            )
            .unwrap();

        let mut graph = build_with(
            r#"
main: {type: outer, description: Reverse then mark}
stages:
  suffixer: {mark: "!"}
route: reverse_string suffixer
"#,
            &registry,
        )
        .unwrap();

        assert_eq!(graph.param("suffixer.wrap", "data_suffix"), Some("!".into()));
        assert!(graph.node_names().contains(&"suffixer.wrap".to_string()));

        let results = graph.pump_data(vec![Unit::from_text("ab")]).unwrap();
        assert_eq!(texts(&results), vec!["ba!"]);

        graph
            .send_message(Message::parse("suffixer.wrap", "reset:data_suffix:?").unwrap())
            .unwrap();
        let results = graph.pump_data(vec![Unit::from_text("ab")]).unwrap();
        assert_eq!(texts(&results), vec!["ba?"]);
    }

    #[test]
    fn test_sub_graph_without_its_parameter_fails() {
        let mut registry = Registry::with_builtins();
        registry
            .register_graph(
                parse_pipeline_config(
                    "main: {type: suffixer, description: Adds a mark, keys: [mark]}\nroute: wrap::${mark}",
                    ConfigFormat::Yaml,
                )
                .unwrap(),
            )
            .unwrap();

        let err = build_with(
            "main: {type: outer, description: Missing mark}\nroute: suffixer",
            &registry,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Structural(_)));
    }

    #[test]
    fn test_self_nesting_graph_is_too_deep() {
        let mut registry = Registry::with_builtins();
        registry
            .register_graph(
                parse_pipeline_config(
                    "main: {type: echo, description: Contains itself}\nroute: echo",
                    ConfigFormat::Yaml,
                )
                .unwrap(),
            )
            .unwrap();

        let err = build_with("main: {type: top, description: Top}\nroute: echo", &registry)
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn test_build_time_errors() {
        let err = build("main: {type: bad, description: Feeder}\nroute: tank_feed sink").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Routing(RoutingError::FeederWithoutBuffer { .. })
        ));

        let err = build("main: {type: bad, description: Unknown}\nroute: no_such_stage").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::UnknownType { .. })
        ));

        let err = build("main: {type: bad, description: Essentials}\nroute: reset").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::MissingParameter { .. })
        ));

        let err = build("main: {type: bad, description: Syntax}\nroute: wrap (sink").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::RouteSyntax(_))
        ));

        let config = parse_pipeline_config("main: {type: bad, description: Root}\nroute: wrap", ConfigFormat::Yaml).unwrap();
        let registry = Registry::with_builtins();
        let err = GraphBuilder::new(&config, &registry)
            .param("undeclared", 1)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::UndeclaredParameter { .. })
        ));
    }

    #[test]
    fn test_graph_keys_must_be_lower_case() {
        let err = build("main: {type: loud, description: Keys, keys: ['Size:1']}\nroute: wrap").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::NotLowerCase { ref name }) if name == "loud.Size"
        ));
    }

    #[test]
    fn test_rebinding_across_the_graph() {
        let err = build("main: {type: clash, description: Clash}\nroute: wrap:a pass_through wrap:b").unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::ConflictingValue { ref parameter, .. }) if parameter == "data_prefix"
        ));

        let graph = build("main: {type: same, description: Same}\nroute: wrap:a pass_through wrap:a").unwrap();
        assert_eq!(graph.param("wrap", "data_prefix"), Some("a".into()));

        let err = build(
            "main: {type: clash, description: Section clash}\nstages:\n  wrap: {data_prefix: b}\nroute: wrap:a",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Structural(StructuralConfigError::ConflictingValue { .. })
        ));
    }

    #[test]
    fn test_references_resolve_before_rebinding() {
        let mut graph = build(
            "main: {type: refs, description: Refs, keys: ['p:x']}\nstages:\n  wrap: {data_prefix: x}\nroute: wrap:${p}",
        )
        .unwrap();
        assert_eq!(graph.param("wrap", "data_prefix"), Some("x".into()));
        let results = graph.pump_data(vec![Unit::from_text("y")]).unwrap();
        assert_eq!(texts(&results), vec!["xy"]);
    }

    #[test]
    fn test_essentials_pool_binds_missing_parameters() {
        let mut registry = Registry::with_builtins();
        registry.set_essential("destination", "wrap");
        registry.set_essential("param_name", "data_prefix");

        let mut graph = build_with(
            "main: {type: pooled, description: Pool}\nroute: reset wrap",
            &registry,
        )
        .unwrap();
        let results = graph
            .pump_data(vec![Unit::from_text("x").with_attr("data_prefix", ">")])
            .unwrap();
        assert_eq!(texts(&results), vec![">x"]);
    }

    #[test]
    fn test_runtime_routing_errors() {
        let mut graph = build("main: {type: bad, description: No fan-out}\nroute: branch_clone sink").unwrap();
        let err = graph.pump_data(vec![Unit::from_text("x")]).unwrap_err();
        assert!(matches!(err, EngineError::Routing(RoutingError::NoFanOut { .. })));

        let (registry, _) = stub_registry();
        let mut graph = build_with("main: {type: bad, description: Fails}\nroute: failing", &registry).unwrap();
        let err = graph.pump_data(vec![Unit::from_text("x")]).unwrap_err();
        assert!(matches!(err, EngineError::DataProcessing(_)));
    }

    #[test]
    fn test_loop_without_a_tank_is_reentrant() {
        let graph = build("main: {type: loop, description: Plain loop}\nroute: pass_through wrap pass_through").unwrap();
        let err = graph.send(Unit::from_text("x")).unwrap_err();
        assert!(matches!(err, EngineError::Reentrancy(_)));
    }

    #[test]
    fn test_script_stages() {
        let mut registry = Registry::with_builtins();
        registry
            .register_script("shout", &[], |unit, _| {
                unit.set_data(unit.text().to_uppercase());
                Ok(())
            })
            .unwrap();
        registry
            .register_script("picky", &["allowed:abc"], |unit, params| {
                let allowed = params.text("allowed").map_err(|e| e.to_string())?;
                if unit.text() == allowed {
                    Ok(())
                } else {
                    Err(format!("'{}' is not allowed", unit.text()))
                }
            })
            .unwrap();

        let mut graph = build_with("main: {type: scripted, description: Scripts}\nroute: picky shout", &registry).unwrap();
        let results = graph.pump_data(vec![Unit::from_text("abc")]).unwrap();
        assert_eq!(texts(&results), vec!["ABC"]);

        let err = graph.pump_data(vec![Unit::from_text("xyz")]).unwrap_err();
        assert!(matches!(err, EngineError::DataProcessing(_)));
    }

    #[test]
    fn test_closed_graph_rejects_units() {
        let graph = build("main: {type: plain, description: Plain}\nroute: wrap sink").unwrap();
        graph.shutdown().unwrap();
        graph.shutdown().unwrap();

        assert_eq!(graph.state("wrap"), Some(StageState::Closed));
        assert_eq!(graph.state("sink"), Some(StageState::Closed));
        let err = graph.send(Unit::from_text("late")).unwrap_err();
        assert!(matches!(err, EngineError::Routing(RoutingError::StageClosed { .. })));
    }

    #[test]
    fn test_shutdown_from_inside_a_stage_is_deferred() {
        let (registry, journal) = stub_registry();
        let graph = build_with(
            "main: {type: stopper, description: Stops itself}\nroute: shutdown stub",
            &registry,
        )
        .unwrap();

        graph.send(Unit::from_text("x")).unwrap();

        assert!(graph.is_shutting_down());
        assert_eq!(graph.state("shutdown"), Some(StageState::Closed));
        assert_eq!(graph.state("stub"), Some(StageState::Closed));
        assert_eq!(*journal.borrow(), vec!["stub:x", "closed stub"]);
    }

    #[test]
    fn test_reentrancy_during_shutdown_is_suppressed() {
        let (registry, journal) = stub_registry();
        let graph = build_with(
            "main: {type: stop_loop, description: Loops into a shutdown}\nroute: shutdown stub shutdown",
            &registry,
        )
        .unwrap();

        graph.send(Unit::from_text("x")).unwrap();

        assert_eq!(*journal.borrow(), vec!["stub:x", "closed stub"]);
        assert_eq!(graph.state("shutdown"), Some(StageState::Closed));
        assert_eq!(graph.state("stub"), Some(StageState::Closed));
    }
}
