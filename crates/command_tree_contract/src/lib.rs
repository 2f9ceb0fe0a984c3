//! Shared command-tree contracts used by the argument engine, host integrations, and message
//! formatters.
//!
//! This crate is intentionally runtime-agnostic. It defines serializable messages, element keys,
//! parsed domain values, and the error taxonomy without depending on the engine itself.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Localizable message template with positional `%s` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Untranslated template text. Also used as the catalog lookup key.
    pub template: String,
    /// Positional arguments substituted for each `%s` in order.
    #[serde(default)]
    pub args: Vec<String>,
}

impl Message {
    /// Creates a message without arguments.
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            args: Vec::new(),
        }
    }

    /// Appends one positional argument.
    pub fn arg(mut self, value: impl fmt::Display) -> Self {
        self.args.push(value.to_string());
        self
    }

    /// Renders the untranslated template.
    pub fn render(&self) -> String {
        render_template(&self.template, &self.args)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn render_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut args = args.iter();
    let mut rest = template;
    while let Some(index) = rest.find("%s") {
        out.push_str(&rest[..index]);
        match args.next() {
            Some(arg) => out.push_str(arg),
            None => out.push_str("%s"),
        }
        rest = &rest[index + 2..];
    }
    out.push_str(rest);
    out
}

/// Translation table keyed by untranslated template text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    entries: BTreeMap<String, String>,
}

impl MessageCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces one translated template.
    pub fn insert(&mut self, template: impl Into<String>, translated: impl Into<String>) {
        self.entries.insert(template.into(), translated.into());
    }

    /// Returns the translated template for `template`, if any.
    pub fn get(&self, template: &str) -> Option<&str> {
        self.entries.get(template).map(String::as_str)
    }

    /// Number of translated templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders `message`, falling back to its own template when untranslated.
    pub fn translate(&self, message: &Message) -> String {
        let template = self.get(&message.template).unwrap_or(&message.template);
        render_template(template, &message.args)
    }
}

/// Stable key under which an element records its parsed values.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementKey(String);

impl ElementKey {
    /// Creates a key from trusted caller input.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Reference to one permission subject, such as `group:admin`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubjectRef {
    /// Registered subject type, such as `user` or `group`.
    pub subject_type: String,
    /// Identifier within the subject type.
    pub identifier: String,
}

impl SubjectRef {
    /// Creates a subject reference.
    pub fn new(subject_type: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            subject_type: subject_type.into(),
            identifier: identifier.into(),
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.subject_type, self.identifier)
    }
}

/// One `key=value` context entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContextPair {
    /// Context key, such as `world`.
    pub key: String,
    /// Context value. May itself contain `=`.
    pub value: String,
}

impl ContextPair {
    /// Creates a context pair.
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for ContextPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Classification of argument parse failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParseErrorKind {
    /// A required token was not present.
    MissingArgument,
    /// The raw line could not be tokenized.
    Malformed,
    /// The token was well-formed but names nothing valid.
    InvalidValue,
    /// The token did not follow the element's micro-grammar.
    Format,
    /// A child dispatcher had no entry for the consumed name.
    UnknownSubcommand,
    /// Tokens remained after the root element finished.
    TooManyArguments,
}

/// User-facing parse failure at a specific token position.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ArgumentParseError {
    /// Failure classification.
    pub kind: ParseErrorKind,
    /// Localizable message.
    pub message: Message,
    /// Token index the cursor was at.
    pub position: usize,
    /// Byte offset of that token within `source_line`.
    pub offset: usize,
    /// Raw input line.
    pub source_line: String,
}

impl ArgumentParseError {
    /// Creates a parse error.
    pub fn new(
        kind: ParseErrorKind,
        message: Message,
        source_line: impl Into<String>,
        position: usize,
        offset: usize,
    ) -> Self {
        Self {
            kind,
            message,
            position,
            offset,
            source_line: source_line.into(),
        }
    }

    /// Renders the raw input with a `^` marker under the failing token.
    pub fn annotated_position(&self) -> String {
        let width = self
            .source_line
            .get(..self.offset)
            .map(|prefix| prefix.chars().count())
            .unwrap_or_else(|| self.source_line.chars().count());
        format!("{}\n{}^", self.source_line, " ".repeat(width))
    }
}

/// Coarse command failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandErrorCode {
    /// User input violated command usage.
    Usage,
    /// A subcommand name was not found.
    NotFound,
    /// The caller lacks permission to run the command.
    PermissionDenied,
    /// Engine invariant violation.
    Internal,
    /// The handler reported a failure.
    Failed,
}

/// Error emitted by parsing, permission enforcement, the engine, or handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "kebab-case")]
pub enum CommandError {
    /// Input was malformed or semantically invalid.
    #[error(transparent)]
    Parse(#[from] ArgumentParseError),
    /// The caller may not run the resolved command.
    #[error("{message}")]
    PermissionDenied {
        /// Localizable message.
        message: Message,
    },
    /// Engine invariant violation naming the offending element key.
    #[error("internal error for element `{key}`: {message}")]
    Internal {
        /// Element key whose state was inconsistent.
        key: ElementKey,
        /// Localizable message.
        message: Message,
    },
    /// Handler failure.
    #[error("{message}")]
    Failed {
        /// Localizable message.
        message: Message,
    },
}

impl CommandError {
    /// Creates a permission error.
    pub fn permission_denied(message: Message) -> Self {
        Self::PermissionDenied { message }
    }

    /// Creates an internal invariant error.
    pub fn internal(key: ElementKey, message: Message) -> Self {
        Self::Internal { key, message }
    }

    /// Creates a handler failure.
    pub fn failed(message: Message) -> Self {
        Self::Failed { message }
    }

    /// Localizable message carried by the error.
    pub fn message(&self) -> &Message {
        match self {
            Self::Parse(err) => &err.message,
            Self::PermissionDenied { message }
            | Self::Internal { message, .. }
            | Self::Failed { message } => message,
        }
    }

    /// Coarse classification.
    pub fn code(&self) -> CommandErrorCode {
        match self {
            Self::Parse(err) if err.kind == ParseErrorKind::UnknownSubcommand => {
                CommandErrorCode::NotFound
            }
            Self::Parse(_) => CommandErrorCode::Usage,
            Self::PermissionDenied { .. } => CommandErrorCode::PermissionDenied,
            Self::Internal { .. } => CommandErrorCode::Internal,
            Self::Failed { .. } => CommandErrorCode::Failed,
        }
    }

    /// Converts the error into a conventional exit code.
    pub fn exit_code(&self) -> i32 {
        match self.code() {
            CommandErrorCode::Failed => 1,
            CommandErrorCode::Usage => 2,
            CommandErrorCode::NotFound => 3,
            CommandErrorCode::PermissionDenied => 4,
            CommandErrorCode::Internal => 5,
        }
    }
}

/// Convenience result type for command handlers.
pub type CommandResult<T = ()> = Result<T, CommandError>;
