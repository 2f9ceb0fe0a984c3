//! The argument element contract and dispatcher key allocation.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use command_tree_contract::{ArgumentParseError, ElementKey};

use crate::{args::CommandArgs, commander::Commander, context::ParseContext};

/// Shared handle to an element inside a command tree.
pub type ElementRef = Arc<dyn CommandElement>;

/// One named unit of command grammar.
///
/// Every element works in two modes. [`CommandElement::parse`] consumes tokens and records values
/// under [`CommandElement::key`]. [`CommandElement::tab_complete`] inspects whatever tokens remain
/// (possibly a partial last token) and suggests candidates without touching the context.
pub trait CommandElement: Send + Sync {
    /// Key the element records values under. Structural elements have none.
    fn key(&self) -> Option<&ElementKey>;

    /// Consumes tokens and records the produced value.
    ///
    /// On failure the cursor position is unspecified. Callers that need to retry must save and
    /// restore it themselves.
    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError>;

    /// Suggests completions for the remaining tokens. Never fails; ambiguity yields the broadest
    /// reasonable candidate set.
    fn tab_complete(
        &self,
        caller: &dyn Commander,
        args: &mut CommandArgs,
        context: &ParseContext,
    ) -> Vec<String>;

    /// Usage fragments for this element, joined by the caller's formatter.
    fn usage(&self, _caller: &dyn Commander) -> Vec<String> {
        self.key()
            .map(|key| vec![format!("<{key}>")])
            .unwrap_or_default()
    }
}

/// Process-wide sequence behind every [`KeyAllocator`].
static NEXT_CHILD_KEY: AtomicU64 = AtomicU64::new(0);

/// Mints keys for child dispatchers.
///
/// Every allocator draws from one process-wide sequence, so dispatchers built through different
/// allocators never share a key in the same parse context. Numbers are unique but not contiguous.
#[derive(Debug, Default)]
pub struct KeyAllocator {
    _private: (),
}

impl KeyAllocator {
    /// Creates an allocator handle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh `child<N>` key.
    pub fn child_key(&self) -> ElementKey {
        let ordinal = NEXT_CHILD_KEY.fetch_add(1, Ordering::Relaxed);
        ElementKey::new(format!("child{ordinal}"))
    }
}

/// Keeps candidates starting with `prefix`, case-sensitively.
pub(crate) fn starting_with<I>(candidates: I, prefix: &str) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeSet, thread};

    #[test]
    fn allocator_keys_are_unique_across_threads() {
        let allocator = Arc::new(KeyAllocator::new());
        let handles = (0..4)
            .map(|_| {
                let allocator = Arc::clone(&allocator);
                thread::spawn(move || {
                    (0..50)
                        .map(|_| allocator.child_key())
                        .collect::<Vec<_>>()
                })
            })
            .collect::<Vec<_>>();
        let keys = handles
            .into_iter()
            .flat_map(|handle| handle.join().expect("join"))
            .collect::<BTreeSet<_>>();
        assert_eq!(keys.len(), 200);
    }

    #[test]
    fn separate_allocators_never_repeat_keys() {
        let first = KeyAllocator::new();
        let second = KeyAllocator::new();
        let keys = (0..10)
            .flat_map(|_| [first.child_key(), second.child_key()])
            .collect::<BTreeSet<_>>();
        assert_eq!(keys.len(), 20);
    }

    #[test]
    fn prefix_filter_is_case_sensitive() {
        let names = vec!["sub1".to_string(), "Sub2".to_string(), "other".to_string()];
        assert_eq!(starting_with(names, "su"), vec!["sub1".to_string()]);
    }
}
