//! Caller identity and plain-text message formatting.

use std::collections::BTreeSet;

use command_tree_contract::{ContextPair, Message, MessageCatalog, SubjectRef};

/// Renders structured pieces of command output for one caller.
///
/// Implementations decide styling. The engine only relies on [`MessageFormatter::combined`]
/// (usage strings) and [`MessageFormatter::translated`] (error messages).
pub trait MessageFormatter {
    /// Joins already-rendered parts into one text.
    fn combined(&self, parts: &[String]) -> String;

    /// Renders a localizable message.
    fn translated(&self, message: &Message) -> String;

    /// Renders a subject reference.
    fn subject(&self, subject: &SubjectRef) -> String;

    /// Renders a context pair.
    fn context(&self, pair: &ContextPair) -> String;
}

/// Unstyled formatter backed by an optional translation catalog.
#[derive(Debug, Clone, Default)]
pub struct PlainFormatter {
    catalog: MessageCatalog,
}

impl PlainFormatter {
    /// Creates a formatter that renders untranslated templates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a formatter that translates through `catalog`.
    pub fn with_catalog(catalog: MessageCatalog) -> Self {
        Self { catalog }
    }
}

impl MessageFormatter for PlainFormatter {
    fn combined(&self, parts: &[String]) -> String {
        parts.concat()
    }

    fn translated(&self, message: &Message) -> String {
        self.catalog.translate(message)
    }

    fn subject(&self, subject: &SubjectRef) -> String {
        format!("{} {}", subject.subject_type, subject.identifier)
    }

    fn context(&self, pair: &ContextPair) -> String {
        pair.to_string()
    }
}

/// Whoever invokes a command: a player, the console, or a remote client.
pub trait Commander {
    /// Display name of the caller.
    fn name(&self) -> &str;

    /// Whether the caller holds `permission`.
    fn has_permission(&self, permission: &str) -> bool;

    /// Formatter used to render text for this caller.
    fn formatter(&self) -> &dyn MessageFormatter;
}

/// Caller with an explicit set of granted permission nodes.
///
/// A granted `*` matches everything. A granted `a.b.*` matches `a.b` and every node below it.
#[derive(Debug, Clone)]
pub struct SimpleCommander {
    name: String,
    permissions: BTreeSet<String>,
    formatter: PlainFormatter,
}

impl SimpleCommander {
    /// Creates a caller with no permissions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: BTreeSet::new(),
            formatter: PlainFormatter::new(),
        }
    }

    /// Grants one permission node.
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Replaces the formatter.
    pub fn with_formatter(mut self, formatter: PlainFormatter) -> Self {
        self.formatter = formatter;
        self
    }
}

impl Commander for SimpleCommander {
    fn name(&self) -> &str {
        &self.name
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|granted| {
            if granted == "*" || granted == permission {
                return true;
            }
            match granted.strip_suffix(".*") {
                Some(prefix) => {
                    permission == prefix
                        || permission
                            .strip_prefix(prefix)
                            .is_some_and(|rest| rest.starts_with('.'))
                }
                None => false,
            }
        })
    }

    fn formatter(&self) -> &dyn MessageFormatter {
        &self.formatter
    }
}
