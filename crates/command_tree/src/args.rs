//! Rewindable token cursor over one raw command line.

use command_tree_contract::{ArgumentParseError, Message, ParseErrorKind};
use command_tree_lexer::{tokenize, tokenize_partial, Token};

/// Positional view over the tokens of one invocation.
///
/// A cursor is created per parse or completion pass and is never shared between invocations.
#[derive(Debug, Clone)]
pub struct CommandArgs {
    raw: String,
    tokens: Vec<Token>,
    index: usize,
}

impl CommandArgs {
    /// Tokenizes `raw` strictly for parsing.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ArgumentParseError> {
        let raw = raw.into();
        match tokenize(&raw) {
            Ok(tokens) => Ok(Self::from_tokens(raw, tokens)),
            Err(err) => {
                let position = tokenize_partial(&raw)
                    .iter()
                    .filter(|token| token.start < err.offset)
                    .count();
                Err(ArgumentParseError::new(
                    ParseErrorKind::Malformed,
                    Message::new(err.message),
                    raw,
                    position,
                    err.offset,
                ))
            }
        }
    }

    /// Tokenizes possibly incomplete `raw` for completion.
    pub fn partial(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let tokens = tokenize_partial(&raw);
        Self::from_tokens(raw, tokens)
    }

    /// Builds a cursor over already-split tokens.
    pub fn from_tokens(raw: impl Into<String>, tokens: Vec<Token>) -> Self {
        Self {
            raw: raw.into(),
            tokens,
            index: 0,
        }
    }

    /// Whether at least one more token is available.
    pub fn has_next(&self) -> bool {
        self.index < self.tokens.len()
    }

    /// Number of tokens not yet consumed.
    pub fn remaining(&self) -> usize {
        self.tokens.len().saturating_sub(self.index)
    }

    /// Returns the next token without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.tokens.get(self.index).map(|token| token.text.as_str())
    }

    /// Consumes the next token, failing when input is exhausted.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Result<String, ArgumentParseError> {
        self.next_if_present().ok_or_else(|| {
            self.create_error(
                ParseErrorKind::MissingArgument,
                Message::new("Not enough arguments!"),
            )
        })
    }

    /// Consumes the next token if there is one.
    pub fn next_if_present(&mut self) -> Option<String> {
        let token = self.tokens.get(self.index)?.text.clone();
        self.index += 1;
        Some(token)
    }

    /// Current token index.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Rewinds (or advances) to a previously observed position.
    pub fn set_position(&mut self, position: usize) {
        self.index = position.min(self.tokens.len());
    }

    /// Builds a parse error at the current position.
    ///
    /// The byte offset points at the token the cursor last consumed, or at the end of input when
    /// the line has no tokens.
    pub fn create_error(&self, kind: ParseErrorKind, message: Message) -> ArgumentParseError {
        let position = self.index.saturating_sub(1);
        let offset = self
            .tokens
            .get(position)
            .map(|token| token.start)
            .unwrap_or(self.raw.len());
        ArgumentParseError::new(kind, message, self.raw.clone(), self.index, offset)
    }
}
