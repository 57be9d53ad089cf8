// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::lexer::{Lexed, Token, TokenKind};
use crate::errors::RouteSyntaxError;

/// One element of a parsed pipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    /// A stage reference exactly as written, `:values` included.
    Stage(String),
    Branch(Vec<Element>),
}

struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
    end: (usize, usize),
}

/// Parses a token stream into a pipe. Rejects every malformed shape the
/// grammar rules out; nothing partial is ever returned.
pub fn parse(lexed: Lexed) -> Result<Vec<Element>, RouteSyntaxError> {
    let mut parser = Parser {
        tokens: lexed.tokens,
        cursor: 0,
        end: lexed.end,
    };
    let pipe = parser.pipe(0)?;
    if pipe.is_empty() {
        let (line, column) = parser.end;
        return Err(RouteSyntaxError::EmptyRoute { line, column });
    }
    Ok(pipe)
}

impl Parser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned();
        self.cursor += 1;
        token
    }

    fn pipe(&mut self, depth: usize) -> Result<Vec<Element>, RouteSyntaxError> {
        let mut elements = Vec::new();
        loop {
            let Some(token) = self.next() else {
                if depth > 0 {
                    let (line, column) = self.end;
                    return Err(RouteSyntaxError::UnexpectedEnd { line, column });
                }
                return Ok(elements);
            };
            let (line, column) = (token.line, token.column);
            match token.kind {
                TokenKind::Ident(text) => elements.push(Element::Stage(text)),
                TokenKind::Open => {
                    match elements.last() {
                        None => return Err(RouteSyntaxError::BranchWithoutStage { line, column }),
                        Some(Element::Branch(_)) => {
                            return Err(RouteSyntaxError::AdjacentBranches { line, column })
                        }
                        Some(Element::Stage(_)) => {}
                    }
                    let inner = self.pipe(depth + 1)?;
                    if inner.is_empty() {
                        return Err(RouteSyntaxError::EmptyBranch { line, column });
                    }
                    elements.push(Element::Branch(inner));
                }
                TokenKind::Close if depth > 0 => return Ok(elements),
                TokenKind::Close => {
                    return Err(RouteSyntaxError::UnexpectedToken {
                        token: ")".to_string(),
                        line,
                        column,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::lexer::tokenize;

    fn parse_text(text: &str) -> Result<Vec<Element>, RouteSyntaxError> {
        parse(tokenize(text)?)
    }

    #[test]
    fn test_nested_structure() {
        let pipe = parse_text("a (b (c) d) e").unwrap();
        assert_eq!(
            pipe,
            vec![
                Element::Stage("a".into()),
                Element::Branch(vec![
                    Element::Stage("b".into()),
                    Element::Branch(vec![Element::Stage("c".into())]),
                    Element::Stage("d".into()),
                ]),
                Element::Stage("e".into()),
            ]
        );
    }

    #[test]
    fn test_malformed_routes() {
        assert_eq!(
            parse_text("a (b c").unwrap_err(),
            RouteSyntaxError::UnexpectedEnd { line: 1, column: 7 }
        );
        assert_eq!(
            parse_text("a () c").unwrap_err(),
            RouteSyntaxError::EmptyBranch { line: 1, column: 3 }
        );
        assert_eq!(
            parse_text("(a (b) c)").unwrap_err(),
            RouteSyntaxError::BranchWithoutStage { line: 1, column: 1 }
        );
        assert_eq!(
            parse_text("a (b) (c) d").unwrap_err(),
            RouteSyntaxError::AdjacentBranches { line: 1, column: 7 }
        );
        assert!(matches!(
            parse_text("a b) c").unwrap_err(),
            RouteSyntaxError::UnexpectedToken { ref token, line: 1, column: 4 } if token == ")"
        ));
        assert!(matches!(
            parse_text("  # nothing here\n").unwrap_err(),
            RouteSyntaxError::EmptyRoute { .. }
        ));
    }

    #[test]
    fn test_trailing_branch_is_accepted() {
        let pipe = parse_text("a (b)").unwrap();
        assert_eq!(pipe.len(), 2);
    }
}
