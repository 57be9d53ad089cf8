// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::parser::Element;

const INDENT: &str = "    ";

/// One element per line, branches indented and wrapped in parentheses.
pub fn pretty_lines(elements: &[Element]) -> Vec<String> {
    lines(elements, 0)
        .into_iter()
        .map(|(depth, text)| format!("{}{}", INDENT.repeat(depth), text))
        .collect()
}

fn lines(elements: &[Element], depth: usize) -> Vec<(usize, String)> {
    let mut out = Vec::new();
    for element in elements {
        match element {
            Element::Stage(reference) => out.push((depth, reference.clone())),
            Element::Branch(inner) => {
                let mut inner_lines = lines(inner, depth + 1);
                if let Some(first) = inner_lines.first_mut() {
                    first.1.insert(0, '(');
                }
                if let Some(last) = inner_lines.last_mut() {
                    last.1.push(')');
                }
                out.extend(inner_lines);
            }
        }
    }
    out
}

/// The canonical single-line form.
pub fn single_line(elements: &[Element]) -> String {
    elements
        .iter()
        .map(|element| match element {
            Element::Stage(reference) => reference.clone(),
            Element::Branch(inner) => format!("({})", single_line(inner)),
        })
        .collect::<Vec<_>>()
        .join(" ")
}
