// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::errors::RouteSyntaxError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Ident(String),
    Open,
    Close,
}

/// A token with the 1-based line and column of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn describe(&self) -> String {
        match &self.kind {
            TokenKind::Ident(text) => text.clone(),
            TokenKind::Open => "(".to_string(),
            TokenKind::Close => ")".to_string(),
        }
    }
}

/// Tokens plus the position just past the last character.
#[derive(Debug)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub end: (usize, usize),
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-' | '$' | '{' | '}')
}

pub fn tokenize(text: &str) -> Result<Lexed, RouteSyntaxError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();
    let (mut line, mut column) = (1usize, 1usize);

    while let Some(&c) = chars.peek() {
        match c {
            '\n' => {
                chars.next();
                line += 1;
                column = 1;
            }
            ' ' | '\t' | '\r' => {
                chars.next();
                column += 1;
            }
            '#' => {
                while let Some(&c) = chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    chars.next();
                    column += 1;
                }
            }
            '(' | ')' => {
                chars.next();
                let kind = if c == '(' {
                    TokenKind::Open
                } else {
                    TokenKind::Close
                };
                tokens.push(Token { kind, line, column });
                column += 1;
            }
            c if is_ident_start(c) => {
                let start = column;
                let mut ident = String::new();
                while let Some(&c) = chars.peek() {
                    if !is_ident_continue(c) {
                        break;
                    }
                    ident.push(c);
                    chars.next();
                    column += 1;
                }
                tokens.push(Token {
                    kind: TokenKind::Ident(ident),
                    line,
                    column: start,
                });
            }
            other => {
                return Err(RouteSyntaxError::IllegalCharacter {
                    ch: other,
                    line,
                    column,
                })
            }
        }
    }

    Ok(Lexed {
        tokens,
        end: (line, column),
    })
}
