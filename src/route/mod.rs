// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Route-grammar compiler.
//!
//! ```text
//! route  := pipe
//! pipe   := stage_ref | pipe stage_ref | pipe branch stage_ref | pipe branch
//! branch := '(' pipe ')'
//! ```
//!
//! Every branch gets a synthesized fan-out node (`hidden_brancher_NN`) placed
//! between the preceding stage, the branch's inner sequence and whatever
//! follows. Edges come back sorted by position with each fan-out's branch
//! edge ahead of its main edge.
//!
//! # Example
//! ```
//! use the_filterworks::route::compile;
//!
//! let route = compile("read (write) reverse").unwrap();
//! assert_eq!(
//!     route.connections(),
//!     vec![
//!         "read >>> hidden_brancher_01",
//!         "hidden_brancher_01 ^^^ write",
//!         "hidden_brancher_01 >>> reverse",
//!         "write >>> None",
//!         "reverse >>> None",
//!     ]
//! );
//! ```

mod compiler;
mod lexer;
mod parser;
mod printer;

pub use compiler::{CompiledRoute, EdgeKind, RouteEdge, Target};

use crate::errors::RouteSyntaxError;
use crate::observability::messages::route::{RouteCompiled, RouteRejected};
use crate::observability::messages::StructuredLog;

fn parse_text(text: &str) -> Result<Vec<parser::Element>, RouteSyntaxError> {
    parser::parse(lexer::tokenize(text)?)
}

/// Compiles route text into an edge list.
pub fn compile(text: &str) -> Result<CompiledRoute, RouteSyntaxError> {
    let elements = parse_text(text).map_err(|error| {
        RouteRejected {
            route: text,
            error: &error,
        }
        .log();
        error
    })?;
    let compiled = compiler::compile_pipe(&elements);
    RouteCompiled {
        route: text,
        node_count: compiled.ordered_names.len(),
        edge_count: compiled.edges.len(),
    }
    .log();
    Ok(compiled)
}

/// Multi-line rendering: one element per line, branches indented four
/// spaces per depth and wrapped in parentheses.
pub fn pretty_print(text: &str) -> Result<Vec<String>, RouteSyntaxError> {
    Ok(printer::pretty_lines(&parse_text(text)?))
}

/// Canonical one-line rendering (comments and extra whitespace dropped).
pub fn render(text: &str) -> Result<String, RouteSyntaxError> {
    Ok(printer::single_line(&parse_text(text)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_edges() {
        let route = compile("a b c").unwrap();
        assert_eq!(
            route.connections(),
            vec!["a >>> b", "b >>> c", "c >>> None"]
        );
        assert_eq!(route.ordered_names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fan_out_edges_keep_values() {
        let route = compile("A (B:34) C D").unwrap();
        assert_eq!(
            route.connections(),
            vec![
                "A >>> hidden_brancher_01",
                "hidden_brancher_01 ^^^ B:34",
                "hidden_brancher_01 >>> C",
                "B:34 >>> None",
                "C >>> D",
                "D >>> None",
            ]
        );
        assert_eq!(
            route.ordered_names,
            vec!["A", "hidden_brancher_01", "B", "C", "D"]
        );
        assert_eq!(route.referenced_names, vec!["A", "B:34", "C", "D"]);
    }

    #[test]
    fn test_nested_branches() {
        let route = compile("A:2 (B (C D) E) F (G H) J").unwrap();
        assert_eq!(
            route.connections(),
            vec![
                "A:2 >>> hidden_brancher_01",
                "hidden_brancher_01 ^^^ B",
                "hidden_brancher_01 >>> F",
                "B >>> hidden_brancher_02",
                "hidden_brancher_02 ^^^ C",
                "hidden_brancher_02 >>> E",
                "C >>> D",
                "D >>> None",
                "E >>> None",
                "F >>> hidden_brancher_03",
                "hidden_brancher_03 ^^^ G",
                "hidden_brancher_03 >>> J",
                "G >>> H",
                "H >>> None",
                "J >>> None",
            ]
        );
    }

    #[test]
    fn test_branch_edge_precedes_main_edge() {
        let route = compile("x (y) z").unwrap();
        let fan_out: Vec<&RouteEdge> = route
            .edges
            .iter()
            .filter(|e| e.from == "hidden_brancher_01")
            .collect();
        assert_eq!(fan_out[0].kind, EdgeKind::Branch);
        assert_eq!(fan_out[1].kind, EdgeKind::Main);
    }

    #[test]
    fn test_recursive_route_repeats_a_node() {
        let route =
            compile("tank_queue:0 factorial_calc branch_if:recurse (tank_feed tank_queue) sink")
                .unwrap();
        assert_eq!(
            route.connections(),
            vec![
                "tank_queue:0 >>> factorial_calc",
                "factorial_calc >>> branch_if:recurse",
                "branch_if:recurse >>> hidden_brancher_01",
                "hidden_brancher_01 ^^^ tank_feed",
                "hidden_brancher_01 >>> sink",
                "tank_feed >>> tank_queue",
                "tank_queue >>> None",
                "sink >>> None",
            ]
        );
        assert_eq!(
            route.ordered_names,
            vec![
                "tank_queue",
                "factorial_calc",
                "branch_if",
                "hidden_brancher_01",
                "tank_feed",
                "sink"
            ]
        );
    }

    #[test]
    fn test_trailing_branch_ends_in_terminal_main() {
        let route = compile("a (b)").unwrap();
        assert_eq!(
            route.connections(),
            vec![
                "a >>> hidden_brancher_01",
                "hidden_brancher_01 ^^^ b",
                "hidden_brancher_01 >>> None",
                "b >>> None",
            ]
        );
    }

    #[test]
    fn test_identical_edges_are_deduplicated() {
        let route = compile("a b a b").unwrap();
        assert_eq!(
            route.connections(),
            vec!["a >>> b", "b >>> a", "b >>> None"]
        );
        assert_eq!(route.ordered_names, vec!["a", "b"]);
    }

    #[test]
    fn test_pretty_print_round_trips() {
        let text = "A:2 (B (C D) E) F (G (H)) J # done";
        let printed = pretty_print(text).unwrap();
        assert_eq!(
            printed,
            vec![
                "A:2",
                "    (B",
                "        (C",
                "        D)",
                "    E)",
                "F",
                "    (G",
                "        (H))",
                "J",
            ]
        );

        let reprinted = printed.join("\n");
        assert_eq!(compile(&reprinted).unwrap(), compile(text).unwrap());
        assert_eq!(render(&reprinted).unwrap(), "A:2 (B (C D) E) F (G (H)) J");
    }

    #[test]
    fn test_errors_carry_position() {
        let err = compile("a\n  b (c").unwrap_err();
        assert_eq!(err, RouteSyntaxError::UnexpectedEnd { line: 2, column: 7 });
        assert_eq!(err.position(), (2, 7));
    }
}
