//! Command-line tokenizer for console and chat command input.
//!
//! This crate intentionally implements only what the argument engine needs: whitespace
//! separation, quoting/escaping, and byte offsets for each token so parse errors can point back
//! into the raw input.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One whitespace-separated token and its byte span in the raw input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Token text after quote removal and escape processing.
    pub text: String,
    /// Byte offset where the token starts.
    pub start: usize,
    /// Byte offset one past the token's last character.
    pub end: usize,
}

/// Tokenizer strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LexMode {
    /// Dangling escapes and unterminated quotes are errors.
    #[default]
    Strict,
    /// Input may be cut off mid-token. Unterminated quotes close at end of input, and trailing
    /// whitespace produces an empty final token.
    Completion,
}

/// Tokenization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct LexError {
    /// Human-readable message.
    pub message: String,
    /// Byte offset where the problem was detected.
    pub offset: usize,
}

impl LexError {
    fn new(message: impl Into<String>, offset: usize) -> Self {
        Self {
            message: message.into(),
            offset,
        }
    }
}

/// Stateless entrypoint for command-line tokenization.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lexer {
    mode: LexMode,
}

impl Lexer {
    /// Creates a lexer in the given mode.
    pub fn new(mode: LexMode) -> Self {
        Self { mode }
    }

    /// Splits `line` into tokens.
    pub fn tokenize(&self, line: &str) -> Result<Vec<Token>, LexError> {
        let lenient = self.mode == LexMode::Completion;
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut start = None::<usize>;
        let mut chars = line.char_indices().peekable();
        let mut quote = None::<char>;

        while let Some((index, ch)) = chars.next() {
            match quote {
                Some(active) if ch == active => quote = None,
                Some(_) if ch == '\\' => match chars.next() {
                    Some((_, next)) => current.push(next),
                    None if lenient => {}
                    None => return Err(LexError::new("dangling escape sequence", index)),
                },
                Some(_) => current.push(ch),
                None if ch.is_whitespace() => {
                    if let Some(begin) = start.take() {
                        tokens.push(Token {
                            text: std::mem::take(&mut current),
                            start: begin,
                            end: index,
                        });
                    }
                }
                None => {
                    start.get_or_insert(index);
                    match ch {
                        '"' | '\'' => quote = Some(ch),
                        '\\' => match chars.next() {
                            Some((_, next)) => current.push(next),
                            None if lenient => {}
                            None => return Err(LexError::new("dangling escape sequence", index)),
                        },
                        _ => current.push(ch),
                    }
                }
            }
        }

        if quote.is_some() && !lenient {
            return Err(LexError::new("unterminated quoted string", line.len()));
        }

        if let Some(begin) = start {
            tokens.push(Token {
                text: current,
                start: begin,
                end: line.len(),
            });
        } else if lenient {
            tokens.push(Token {
                text: String::new(),
                start: line.len(),
                end: line.len(),
            });
        }

        Ok(tokens)
    }
}

/// Tokenizes `line` in strict mode.
pub fn tokenize(line: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(LexMode::Strict).tokenize(line)
}

/// Tokenizes possibly incomplete `line` for completion.
pub fn tokenize_partial(line: &str) -> Vec<Token> {
    Lexer::new(LexMode::Completion)
        .tokenize(line)
        .unwrap_or_default()
}
