//! Elements for permission subjects and contexts.

use std::{collections::BTreeSet, sync::Arc};

use command_tree_contract::{
    ArgumentParseError, ContextPair, ElementKey, Message, ParseErrorKind, SubjectRef,
};

use crate::{
    args::CommandArgs,
    commander::Commander,
    config::SubjectConfig,
    context::{ArgValue, ParseContext},
    element::{starting_with, CommandElement, ElementRef},
    subjects::{SubjectRegistry, SubjectStore},
};

/// Expects one registered subject type name.
pub fn subject_type(
    key: impl Into<ElementKey>,
    registry: Arc<dyn SubjectRegistry>,
) -> ElementRef {
    Arc::new(SubjectTypeElement {
        key: key.into(),
        registry,
    })
}

/// Expects a subject as `<type>:<identifier>` or `<type> <identifier>`.
pub fn subject(key: impl Into<ElementKey>, registry: Arc<dyn SubjectRegistry>) -> ElementRef {
    Arc::new(SubjectElement {
        key: key.into(),
        registry,
        default_type: None,
    })
}

/// Like [`subject`], but a lone bare identifier is taken to be of `default_type`.
pub fn subject_with_default(
    key: impl Into<ElementKey>,
    registry: Arc<dyn SubjectRegistry>,
    default_type: impl Into<String>,
) -> ElementRef {
    Arc::new(SubjectElement {
        key: key.into(),
        registry,
        default_type: Some(default_type.into()),
    })
}

/// [`subject`] or [`subject_with_default`] depending on `config`.
pub fn subject_from_config(
    key: impl Into<ElementKey>,
    registry: Arc<dyn SubjectRegistry>,
    config: &SubjectConfig,
) -> ElementRef {
    match &config.default_type {
        Some(default_type) => subject_with_default(key, registry, default_type.clone()),
        None => subject(key, registry),
    }
}

/// Expects one `<key>=<value>` token.
pub fn context(key: impl Into<ElementKey>) -> ElementRef {
    Arc::new(ContextElement { key: key.into() })
}

struct SubjectTypeElement {
    key: ElementKey,
    registry: Arc<dyn SubjectRegistry>,
}

impl CommandElement for SubjectTypeElement {
    fn key(&self) -> Option<&ElementKey> {
        Some(&self.key)
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        let next = args.next()?;
        if !self.registry.registered_subject_types().contains(&next) {
            return Err(args.create_error(
                ParseErrorKind::InvalidValue,
                Message::new("Subject type %s was not valid!").arg(&next),
            ));
        }
        context.put_arg(&self.key, ArgValue::Text(next));
        Ok(())
    }

    fn tab_complete(
        &self,
        _caller: &dyn Commander,
        args: &mut CommandArgs,
        _context: &ParseContext,
    ) -> Vec<String> {
        let partial = args.next_if_present().unwrap_or_default();
        starting_with(self.registry.registered_subject_types(), &partial)
    }
}

struct SubjectElement {
    key: ElementKey,
    registry: Arc<dyn SubjectRegistry>,
    default_type: Option<String>,
}

impl SubjectElement {
    fn parse_value(&self, args: &mut CommandArgs) -> Result<SubjectRef, ArgumentParseError> {
        let first = args.next()?;
        let (subject_type, mut identifier) = if let Some((subject_type, identifier)) =
            first.split_once(':')
        {
            (subject_type.to_string(), identifier.to_string())
        } else {
            match &self.default_type {
                Some(default_type) if !args.has_next() => (default_type.clone(), first),
                _ => {
                    let identifier = args.next()?;
                    (first, identifier)
                }
            }
        };

        let known = self
            .registry
            .is_registered(SubjectStore::Persistent, &subject_type, &identifier)
            || self
                .registry
                .is_registered(SubjectStore::Transient, &subject_type, &identifier);
        if !known {
            if let Some(normalized) = self
                .registry
                .transform_name(&subject_type, &identifier)
                .filter(|normalized| !normalized.is_empty())
            {
                identifier = normalized;
            }
        }
        Ok(SubjectRef::new(subject_type, identifier))
    }

    /// Raw and normalized identifiers of `subject_type` starting with `prefix`, deduplicated.
    fn identifiers(&self, subject_type: &str, prefix: &str) -> Vec<String> {
        let raw = [SubjectStore::Persistent, SubjectStore::Transient]
            .into_iter()
            .flat_map(|store| self.registry.all_identifiers(store, subject_type))
            .collect::<Vec<_>>();
        let normalized = raw
            .iter()
            .filter_map(|identifier| self.registry.transform_name(subject_type, identifier))
            .filter(|identifier| !identifier.is_empty())
            .collect::<Vec<_>>();

        let mut seen = BTreeSet::new();
        raw.into_iter()
            .chain(normalized)
            .filter(|identifier| identifier.starts_with(prefix))
            .filter(|identifier| seen.insert(identifier.clone()))
            .collect()
    }
}

impl CommandElement for SubjectElement {
    fn key(&self) -> Option<&ElementKey> {
        Some(&self.key)
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        let subject = self.parse_value(args)?;
        context.put_arg(&self.key, ArgValue::Subject(subject));
        Ok(())
    }

    fn tab_complete(
        &self,
        _caller: &dyn Commander,
        args: &mut CommandArgs,
        _context: &ParseContext,
    ) -> Vec<String> {
        let Some(first) = args.next_if_present() else {
            return self.registry.registered_subject_types().into_iter().collect();
        };

        if let Some(identifier) = args.next_if_present() {
            return self.identifiers(&first, &identifier);
        }

        if let Some((subject_type, partial)) = first.split_once(':') {
            return self
                .identifiers(subject_type, partial)
                .into_iter()
                .map(|identifier| format!("{subject_type}:{identifier}"))
                .collect();
        }

        let mut candidates = starting_with(self.registry.registered_subject_types(), &first);
        if let Some(default_type) = &self.default_type {
            for identifier in self.identifiers(default_type, &first) {
                if !candidates.contains(&identifier) {
                    candidates.push(identifier);
                }
            }
        }
        candidates
    }

    fn usage(&self, _caller: &dyn Commander) -> Vec<String> {
        match &self.default_type {
            Some(_) => vec![format!("[<type>:]<{}>", self.key)],
            None => vec![format!("<type>:<{}>", self.key)],
        }
    }
}

struct ContextElement {
    key: ElementKey,
}

impl CommandElement for ContextElement {
    fn key(&self) -> Option<&ElementKey> {
        Some(&self.key)
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        // TODO: accept `<key> <value>` split across two tokens.
        let raw = args.next()?;
        let Some((key, value)) = raw.split_once('=') else {
            return Err(args.create_error(
                ParseErrorKind::Format,
                Message::new("Context must be of the form <key>=<value>!"),
            ));
        };
        context.put_arg(&self.key, ArgValue::Context(ContextPair::new(key, value)));
        Ok(())
    }

    /// Context values are not completable.
    fn tab_complete(
        &self,
        _caller: &dyn Commander,
        _args: &mut CommandArgs,
        _context: &ParseContext,
    ) -> Vec<String> {
        Vec::new()
    }

    fn usage(&self, _caller: &dyn Commander) -> Vec<String> {
        vec![format!("<{}=value>", self.key)]
    }
}
