//! Structural elements for composing command grammars.

use std::sync::Arc;

use command_tree_contract::{ArgumentParseError, ElementKey};

use crate::{
    args::CommandArgs,
    commander::Commander,
    context::{ArgValue, ParseContext},
    element::{CommandElement, ElementRef},
};

/// Element that consumes nothing.
pub fn none() -> ElementRef {
    Arc::new(NoneElement)
}

/// Element that records one token verbatim.
pub fn string(key: impl Into<ElementKey>) -> ElementRef {
    Arc::new(StringElement { key: key.into() })
}

/// Elements parsed one after another.
pub fn seq(elements: impl IntoIterator<Item = ElementRef>) -> ElementRef {
    Arc::new(SequenceElement {
        elements: elements.into_iter().collect(),
    })
}

/// Parses `element` only when tokens remain. Parse errors still propagate.
pub fn optional(element: ElementRef) -> ElementRef {
    Arc::new(OptionalElement {
        element,
        weak: false,
    })
}

/// Like [`optional`], but a failed parse rewinds and is skipped.
pub fn optional_weak(element: ElementRef) -> ElementRef {
    Arc::new(OptionalElement {
        element,
        weak: true,
    })
}

struct NoneElement;

impl CommandElement for NoneElement {
    fn key(&self) -> Option<&ElementKey> {
        None
    }

    fn parse(
        &self,
        _args: &mut CommandArgs,
        _context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        Ok(())
    }

    fn tab_complete(
        &self,
        _caller: &dyn Commander,
        _args: &mut CommandArgs,
        _context: &ParseContext,
    ) -> Vec<String> {
        Vec::new()
    }
}

struct StringElement {
    key: ElementKey,
}

impl CommandElement for StringElement {
    fn key(&self) -> Option<&ElementKey> {
        Some(&self.key)
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        let value = args.next()?;
        context.put_arg(&self.key, ArgValue::Text(value));
        Ok(())
    }

    fn tab_complete(
        &self,
        _caller: &dyn Commander,
        _args: &mut CommandArgs,
        _context: &ParseContext,
    ) -> Vec<String> {
        Vec::new()
    }
}

struct SequenceElement {
    elements: Vec<ElementRef>,
}

impl CommandElement for SequenceElement {
    fn key(&self) -> Option<&ElementKey> {
        None
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        for element in &self.elements {
            element.parse(args, context)?;
        }
        Ok(())
    }

    fn tab_complete(
        &self,
        caller: &dyn Commander,
        args: &mut CommandArgs,
        context: &ParseContext,
    ) -> Vec<String> {
        // Leading elements parse into a scratch copy so the caller's context stays untouched.
        let mut scratch = context.clone();
        let last = self.elements.len().saturating_sub(1);
        for (index, element) in self.elements.iter().enumerate() {
            let start = args.position();
            if index < last && element.parse(args, &mut scratch).is_ok() && args.has_next() {
                continue;
            }
            args.set_position(start);
            return element.tab_complete(caller, args, &scratch);
        }
        Vec::new()
    }

    fn usage(&self, caller: &dyn Commander) -> Vec<String> {
        let mut parts = Vec::new();
        for element in &self.elements {
            let usage = element.usage(caller);
            if usage.is_empty() {
                continue;
            }
            if !parts.is_empty() {
                parts.push(" ".to_string());
            }
            parts.extend(usage);
        }
        parts
    }
}

struct OptionalElement {
    element: ElementRef,
    weak: bool,
}

impl CommandElement for OptionalElement {
    fn key(&self) -> Option<&ElementKey> {
        self.element.key()
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        if !args.has_next() {
            return Ok(());
        }
        if !self.weak {
            return self.element.parse(args, context);
        }
        let start = args.position();
        let snapshot = context.clone();
        if self.element.parse(args, context).is_err() {
            args.set_position(start);
            *context = snapshot;
        }
        Ok(())
    }

    fn tab_complete(
        &self,
        caller: &dyn Commander,
        args: &mut CommandArgs,
        context: &ParseContext,
    ) -> Vec<String> {
        self.element.tab_complete(caller, args, context)
    }

    fn usage(&self, caller: &dyn Commander) -> Vec<String> {
        let inner = self.element.usage(caller);
        if inner.is_empty() {
            return inner;
        }
        let mut parts = Vec::with_capacity(inner.len() + 2);
        parts.push("[".to_string());
        parts.extend(inner);
        parts.push("]".to_string());
        parts
    }
}
