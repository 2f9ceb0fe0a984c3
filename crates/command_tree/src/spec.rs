//! Command definitions and the builder that assembles them.

use std::{fmt, sync::Arc};

use command_tree_contract::{ArgumentParseError, CommandResult, Message, ParseErrorKind};
use thiserror::Error;

use crate::{
    args::CommandArgs,
    children::child_args,
    commander::Commander,
    context::ParseContext,
    element::{CommandElement, ElementRef, KeyAllocator},
    generic::none,
    permission::{self, Access},
};

/// Runs a command once its arguments are parsed.
pub trait CommandExecutor: Send + Sync {
    /// Executes the command for `caller` with the parsed `args`.
    fn execute(&self, caller: &dyn Commander, args: &ParseContext) -> CommandResult;
}

struct FnExecutor<F>(F);

impl<F> CommandExecutor for FnExecutor<F>
where
    F: Fn(&dyn Commander, &ParseContext) -> CommandResult + Send + Sync,
{
    fn execute(&self, caller: &dyn Commander, args: &ParseContext) -> CommandResult {
        (self.0)(caller, args)
    }
}

/// Builder misuse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecBuildError {
    /// No executor was supplied.
    #[error("command {aliases:?} has no executor")]
    MissingExecutor {
        /// Aliases of the incomplete command.
        aliases: Vec<String>,
    },
}

/// Immutable command definition.
///
/// An empty alias list makes the command unnamable: it can still run as a root but can never be
/// resolved by name through a child dispatcher.
pub struct CommandSpec {
    aliases: Vec<String>,
    permission: Option<String>,
    args: ElementRef,
    executor: Arc<dyn CommandExecutor>,
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("aliases", &self.aliases)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

impl CommandSpec {
    /// Starts a new builder.
    pub fn builder() -> CommandSpecBuilder {
        CommandSpecBuilder::default()
    }

    /// All aliases, primary first.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// The first alias, if any.
    pub fn primary_alias(&self) -> Option<&str> {
        self.aliases.first().map(String::as_str)
    }

    /// Permission node required to run and see this command.
    pub fn permission(&self) -> Option<&str> {
        self.permission.as_deref()
    }

    /// Root argument element.
    pub fn arguments(&self) -> &ElementRef {
        &self.args
    }

    /// Whether `caller` may use this command.
    pub fn check_permission(&self, caller: &dyn Commander) -> Access {
        permission::check(self, caller)
    }

    /// Parses this command's grammar from `args` into `context`.
    pub fn parse(
        &self,
        args: &mut CommandArgs,
        context: &mut ParseContext,
    ) -> Result<(), ArgumentParseError> {
        self.args.parse(args, context)
    }

    /// Completion candidates for the remaining tokens.
    pub fn tab_complete(
        &self,
        caller: &dyn Commander,
        args: &mut CommandArgs,
        context: &ParseContext,
    ) -> Vec<String> {
        self.args.tab_complete(caller, args, context)
    }

    /// Usage line for the arguments, rendered by the caller's formatter.
    pub fn usage(&self, caller: &dyn Commander) -> String {
        caller.formatter().combined(&self.args.usage(caller))
    }

    /// Runs the handler without any permission check.
    pub fn execute(&self, caller: &dyn Commander, args: &ParseContext) -> CommandResult {
        self.executor.execute(caller, args)
    }

    /// Parses `line` (the arguments after this command's alias), enforces permissions on this
    /// command and every subcommand it resolved, then executes.
    pub fn process(&self, caller: &dyn Commander, line: &str) -> CommandResult {
        tracing::debug!(
            command = ?self.primary_alias(),
            caller = caller.name(),
            "processing command"
        );
        let context = parse_line(self.args.as_ref(), line)?;
        permission::enforce(self, caller)?;
        permission::enforce_resolved(&context, caller)?;
        self.execute(caller, &context)
    }

    /// Completion candidates for a partial argument line.
    pub fn complete_line(&self, caller: &dyn Commander, line: &str) -> Vec<String> {
        let mut args = CommandArgs::partial(line);
        self.tab_complete(caller, &mut args, &ParseContext::new())
    }
}

/// Parses a whole line with `element`, rejecting leftover tokens.
pub(crate) fn parse_line(
    element: &dyn CommandElement,
    line: &str,
) -> Result<ParseContext, ArgumentParseError> {
    let mut args = CommandArgs::parse(line)?;
    let mut context = ParseContext::new();
    element.parse(&mut args, &mut context)?;
    if args.has_next() {
        args.next_if_present();
        return Err(args.create_error(
            ParseErrorKind::TooManyArguments,
            Message::new("Too many arguments!"),
        ));
    }
    Ok(context)
}

/// Builder for [`CommandSpec`].
#[derive(Default)]
pub struct CommandSpecBuilder {
    aliases: Vec<String>,
    permission: Option<String>,
    args: Option<ElementRef>,
    executor: Option<Arc<dyn CommandExecutor>>,
}

impl CommandSpecBuilder {
    /// Replaces the alias list. The first alias is the primary name.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    /// Requires `permission` to run and see the command.
    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.permission = Some(permission.into());
        self
    }

    /// Sets the root argument element. Defaults to an element that consumes nothing.
    pub fn arguments(mut self, args: ElementRef) -> Self {
        self.args = Some(args);
        self
    }

    /// Sets the handler.
    pub fn executor(mut self, executor: impl CommandExecutor + 'static) -> Self {
        self.executor = Some(Arc::new(executor));
        self
    }

    /// Sets the handler from a closure.
    pub fn executor_fn<F>(self, executor: F) -> Self
    where
        F: Fn(&dyn Commander, &ParseContext) -> CommandResult + Send + Sync + 'static,
    {
        self.executor(FnExecutor(executor))
    }

    /// Dispatches into `children` by name and forwards execution to the resolved child.
    pub fn child_arguments(
        mut self,
        keys: &KeyAllocator,
        children: impl IntoIterator<Item = Arc<CommandSpec>>,
    ) -> Self {
        let dispatcher = child_args(keys, children);
        self.executor = Some(Arc::new(dispatcher.executor()));
        self.args = Some(dispatcher);
        self
    }

    /// Finishes the specification.
    pub fn build(self) -> Result<CommandSpec, SpecBuildError> {
        let Some(executor) = self.executor else {
            return Err(SpecBuildError::MissingExecutor {
                aliases: self.aliases,
            });
        };
        Ok(CommandSpec {
            aliases: self.aliases,
            permission: self.permission,
            args: self.args.unwrap_or_else(none),
            executor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commander::SimpleCommander, generic::string};
    use command_tree_contract::{CommandError, CommandErrorCode};
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn build_requires_an_executor() {
        let err = CommandSpec::builder()
            .aliases(["info"])
            .build()
            .expect_err("no executor");
        assert_eq!(
            err,
            SpecBuildError::MissingExecutor {
                aliases: vec!["info".to_string()]
            }
        );
    }

    #[test]
    fn process_parses_and_executes() {
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let spec = CommandSpec::builder()
            .aliases(["echo"])
            .arguments(string("word"))
            .executor_fn(move |_, args| {
                let word = args.one_text(&"word".into()).map(str::to_string);
                *sink.lock().expect("lock") = word;
                Ok(())
            })
            .build()
            .expect("build");

        let caller = SimpleCommander::new("console");
        spec.process(&caller, "hello").expect("process");
        assert_eq!(seen.lock().expect("lock").as_deref(), Some("hello"));
    }

    #[test]
    fn process_rejects_leftover_tokens() {
        let spec = CommandSpec::builder()
            .aliases(["echo"])
            .arguments(string("word"))
            .executor_fn(|_, _| Ok(()))
            .build()
            .expect("build");
        let caller = SimpleCommander::new("console");
        let err = spec.process(&caller, "one two").expect_err("too many");
        let CommandError::Parse(parse) = err else {
            panic!("expected parse error, got {err:?}");
        };
        assert_eq!(parse.kind, ParseErrorKind::TooManyArguments);
        assert_eq!(parse.offset, 4);
    }

    #[test]
    fn process_enforces_own_permission() {
        let spec = CommandSpec::builder()
            .aliases(["reload"])
            .permission("pex.reload")
            .executor_fn(|_, _| Ok(()))
            .build()
            .expect("build");
        let guest = SimpleCommander::new("guest");
        let err = spec.process(&guest, "").expect_err("denied");
        assert_eq!(err.code(), CommandErrorCode::PermissionDenied);

        let admin = SimpleCommander::new("admin").with_permission("pex.reload");
        spec.process(&admin, "").expect("allowed");
    }

    #[test]
    fn execute_skips_permission_checks() {
        let spec = CommandSpec::builder()
            .aliases(["reload"])
            .permission("pex.reload")
            .executor_fn(|_, _| Ok(()))
            .build()
            .expect("build");
        let guest = SimpleCommander::new("guest");
        spec.execute(&guest, &ParseContext::new()).expect("execute");
    }

    #[test]
    fn usage_renders_argument_fragments() {
        let spec = CommandSpec::builder()
            .aliases(["echo"])
            .arguments(string("word"))
            .executor_fn(|_, _| Ok(()))
            .build()
            .expect("build");
        assert_eq!(spec.usage(&SimpleCommander::new("console")), "<word>");
    }
}
