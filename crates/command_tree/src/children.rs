//! Subcommand dispatch: resolving a child command by name and forwarding to it.

use std::{collections::BTreeMap, sync::Arc};

use command_tree_contract::{
    ArgumentParseError, CommandError, CommandResult, ElementKey, Message, ParseErrorKind,
};

use crate::{
    args::CommandArgs,
    commander::Commander,
    context::{ArgValue, ParseContext},
    element::{starting_with, CommandElement, KeyAllocator},
    permission,
    spec::{CommandExecutor, CommandSpec},
};

/// Builds a dispatcher over `children` under a fresh key from `keys`.
///
/// Names are claimed first by every primary alias in order, then by secondary aliases that are
/// still free. The first claimant of a name keeps it. Children without aliases are skipped.
pub fn child_args(
    keys: &KeyAllocator,
    children: impl IntoIterator<Item = Arc<CommandSpec>>,
) -> Arc<ChildCommandElement> {
    let children = children.into_iter().collect::<Vec<_>>();
    let mut by_name = BTreeMap::new();

    for child in &children {
        let Some(primary) = child.primary_alias() else {
            tracing::warn!(?child, "skipping child command without aliases");
            continue;
        };
        if by_name.contains_key(primary) {
            tracing::debug!(alias = primary, "primary alias already claimed");
            continue;
        }
        by_name.insert(primary.to_string(), Arc::clone(child));
    }
    for child in &children {
        for alias in child.aliases().iter().skip(1) {
            by_name
                .entry(alias.clone())
                .or_insert_with(|| Arc::clone(child));
        }
    }

    Arc::new(ChildCommandElement {
        key: keys.child_key(),
        children: by_name,
    })
}

/// Executor that runs the child resolved under `key`.
pub fn executor(key: ElementKey) -> ChildCommandExecutor {
    ChildCommandExecutor { key }
}

/// Element that resolves one child command by name, then parses the child's own arguments.
pub struct ChildCommandElement {
    key: ElementKey,
    children: BTreeMap<String, Arc<CommandSpec>>,
}

impl ChildCommandElement {
    /// Key the resolved child is recorded under.
    pub fn dispatcher_key(&self) -> &ElementKey {
        &self.key
    }

    /// Child registered under `name`.
    pub fn child(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        self.children.get(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Names whose command `caller` is allowed to see, sorted.
    pub fn visible_names(&self, caller: &dyn Commander) -> Vec<String> {
        self.children
            .iter()
            .filter(|(_, child)| permission::is_visible(child, caller))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Executor forwarding to whichever child this element resolved.
    pub fn executor(&self) -> ChildCommandExecutor {
        executor(self.key.clone())
    }
}

impl CommandElement for ChildCommandElement {
    fn key(&self) -> Option<&ElementKey> {
        Some(&self.key)
    }

    fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        let name = args.next()?;
        let Some(child) = self.children.get(&name) else {
            return Err(args.create_error(
                ParseErrorKind::UnknownSubcommand,
                Message::new("Unknown subcommand %s").arg(&name),
            ));
        };
        tracing::debug!(dispatcher = %self.key, subcommand = %name, "resolved subcommand");
        context.put_arg(&self.key, ArgValue::Command(Arc::clone(child)));
        child.parse(args, context)
    }

    fn tab_complete(
        &self,
        caller: &dyn Commander,
        args: &mut CommandArgs,
        context: &ParseContext,
    ) -> Vec<String> {
        let Some(name) = args.next_if_present() else {
            return self.visible_names(caller);
        };
        if !args.has_next() {
            return starting_with(self.visible_names(caller), &name);
        }
        match self.children.get(&name) {
            Some(child) => child.tab_complete(caller, args, context),
            None => Vec::new(),
        }
    }

    fn usage(&self, caller: &dyn Commander) -> Vec<String> {
        let mut parts = Vec::new();
        for name in self.visible_names(caller) {
            if !parts.is_empty() {
                parts.push("|".to_string());
            }
            parts.push(name);
        }
        parts
    }
}

/// Runs the child command recorded under a dispatcher key.
#[derive(Debug, Clone)]
pub struct ChildCommandExecutor {
    key: ElementKey,
}

impl CommandExecutor for ChildCommandExecutor {
    fn execute(&self, caller: &dyn Commander, args: &ParseContext) -> CommandResult {
        let Some(child) = args.one_command(&self.key) else {
            return Err(CommandError::internal(
                self.key.clone(),
                Message::new(
                    "Invalid subcommand state -- only one command spec must be provided for child arg %s",
                )
                .arg(&self.key),
            ));
        };
        child.execute(caller, args)
    }
}
