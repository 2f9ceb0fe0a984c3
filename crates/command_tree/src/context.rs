//! Per-invocation accumulator of parsed element values.

use std::{collections::BTreeMap, sync::Arc};

use command_tree_contract::{ContextPair, ElementKey, SubjectRef};
use serde_json::{json, Map, Value};

use crate::spec::CommandSpec;

/// Value produced by one successful element parse.
#[derive(Debug, Clone)]
pub enum ArgValue {
    /// Plain token text.
    Text(String),
    /// Subject reference from a subject element.
    Subject(SubjectRef),
    /// Context pair from a context element.
    Context(ContextPair),
    /// Command resolved by a child dispatcher.
    Command(Arc<CommandSpec>),
}

impl ArgValue {
    /// Returns the text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the subject payload.
    pub fn as_subject(&self) -> Option<&SubjectRef> {
        match self {
            Self::Subject(subject) => Some(subject),
            _ => None,
        }
    }

    /// Returns the context payload.
    pub fn as_context(&self) -> Option<&ContextPair> {
        match self {
            Self::Context(pair) => Some(pair),
            _ => None,
        }
    }

    /// Returns the resolved command payload.
    pub fn as_command(&self) -> Option<&Arc<CommandSpec>> {
        match self {
            Self::Command(spec) => Some(spec),
            _ => None,
        }
    }

    /// JSON rendering used for diagnostics. Commands render as their primary alias.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Subject(subject) => json!({
                "type": subject.subject_type,
                "identifier": subject.identifier,
            }),
            Self::Context(pair) => json!({ "key": pair.key, "value": pair.value }),
            Self::Command(spec) => spec
                .primary_alias()
                .map(|alias| Value::String(alias.to_string()))
                .unwrap_or(Value::Null),
        }
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left == right,
            (Self::Subject(left), Self::Subject(right)) => left == right,
            (Self::Context(left), Self::Context(right)) => left == right,
            (Self::Command(left), Self::Command(right)) => Arc::ptr_eq(left, right),
            _ => false,
        }
    }
}

/// Multi-valued key/value accumulator filled during one parse pass.
///
/// Each key holds one entry per successful parse of the element that owns it.
#[derive(Debug, Clone, Default)]
pub struct ParseContext {
    values: BTreeMap<ElementKey, Vec<ArgValue>>,
    resolution: Vec<Arc<CommandSpec>>,
}

impl ParseContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `value` under `key`.
    pub fn put_arg(&mut self, key: &ElementKey, value: ArgValue) {
        if let ArgValue::Command(spec) = &value {
            self.resolution.push(Arc::clone(spec));
        }
        self.values.entry(key.clone()).or_default().push(value);
    }

    /// First value recorded under `key`.
    pub fn one(&self, key: &ElementKey) -> Option<&ArgValue> {
        self.values.get(key).and_then(|values| values.first())
    }

    /// Every value recorded under `key`, in parse order.
    pub fn all(&self, key: &ElementKey) -> &[ArgValue] {
        self.values.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `key` has at least one value.
    pub fn has_any(&self, key: &ElementKey) -> bool {
        !self.all(key).is_empty()
    }

    /// Number of values recorded under `key`.
    pub fn count(&self, key: &ElementKey) -> usize {
        self.all(key).len()
    }

    /// Whether nothing was recorded at all.
    pub fn is_empty(&self) -> bool {
        self.values.values().all(Vec::is_empty)
    }

    /// Keys with at least one value.
    pub fn keys(&self) -> impl Iterator<Item = &ElementKey> {
        self.values
            .iter()
            .filter(|(_, values)| !values.is_empty())
            .map(|(key, _)| key)
    }

    /// First text value under `key`.
    pub fn one_text(&self, key: &ElementKey) -> Option<&str> {
        self.one(key).and_then(ArgValue::as_text)
    }

    /// First subject value under `key`.
    pub fn one_subject(&self, key: &ElementKey) -> Option<&SubjectRef> {
        self.one(key).and_then(ArgValue::as_subject)
    }

    /// First context value under `key`.
    pub fn one_context(&self, key: &ElementKey) -> Option<&ContextPair> {
        self.one(key).and_then(ArgValue::as_context)
    }

    /// First resolved command under `key`.
    pub fn one_command(&self, key: &ElementKey) -> Option<&Arc<CommandSpec>> {
        self.one(key).and_then(ArgValue::as_command)
    }

    /// Every context pair under `key`, in parse order.
    pub fn all_contexts(&self, key: &ElementKey) -> Vec<&ContextPair> {
        self.all(key).iter().filter_map(ArgValue::as_context).collect()
    }

    /// Commands resolved by dispatchers, in resolution order.
    pub fn resolved_commands(&self) -> &[Arc<CommandSpec>] {
        &self.resolution
    }

    /// Renders the context as a JSON object of arrays.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        for (key, values) in &self.values {
            object.insert(
                key.as_str().to_string(),
                Value::Array(values.iter().map(ArgValue::to_json).collect()),
            );
        }
        Value::Object(object)
    }
}
