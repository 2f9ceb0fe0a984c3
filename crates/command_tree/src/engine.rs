//! Root command registry and the host-facing dispatch entry points.

use std::sync::Arc;

use command_tree_contract::{CommandError, CommandResult, ElementKey};

use crate::{
    args::CommandArgs,
    children::{child_args, ChildCommandElement},
    commander::{Commander, PlainFormatter},
    config::EngineConfig,
    context::ParseContext,
    element::{CommandElement, KeyAllocator},
    permission,
    spec::{parse_line, CommandExecutor, CommandSpec},
};

/// Collects root commands before the engine is sealed.
#[derive(Debug, Default)]
pub struct CommandEngineBuilder {
    config: EngineConfig,
    keys: KeyAllocator,
    roots: Vec<Arc<CommandSpec>>,
}

impl CommandEngineBuilder {
    /// Allocator for dispatchers inside the commands being registered.
    pub fn keys(&self) -> &KeyAllocator {
        &self.keys
    }

    /// Effective configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Adds a root command. Aliases follow the child dispatcher rules: first claimant wins.
    pub fn register(mut self, spec: impl Into<Arc<CommandSpec>>) -> Self {
        self.roots.push(spec.into());
        self
    }

    /// Seals the registry.
    pub fn build(self) -> CommandEngine {
        let dispatcher = child_args(&self.keys, self.roots);
        tracing::debug!(
            roots = dispatcher.names().count(),
            debug = self.config.debug,
            "command engine ready"
        );
        CommandEngine {
            config: self.config,
            dispatcher,
        }
    }
}

/// Immutable root registry that parses, authorizes, and runs whole command lines.
pub struct CommandEngine {
    config: EngineConfig,
    dispatcher: Arc<ChildCommandElement>,
}

impl CommandEngine {
    /// Starts registering root commands.
    pub fn builder(config: EngineConfig) -> CommandEngineBuilder {
        CommandEngineBuilder {
            config,
            ..CommandEngineBuilder::default()
        }
    }

    /// Effective configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Formatter that translates through the configured message catalog.
    pub fn formatter(&self) -> PlainFormatter {
        PlainFormatter::with_catalog(self.config.messages.clone())
    }

    /// Every name a root command can be invoked by, sorted.
    pub fn root_aliases(&self) -> Vec<&str> {
        self.dispatcher.names().collect()
    }

    /// Key the resolved root command is recorded under.
    pub fn dispatcher_key(&self) -> &ElementKey {
        self.dispatcher.dispatcher_key()
    }

    /// Root command registered under `name`.
    pub fn root(&self, name: &str) -> Option<&Arc<CommandSpec>> {
        self.dispatcher.child(name)
    }

    /// Parses `line`, checks every resolved command against `caller`, then runs the deepest one.
    pub fn dispatch(&self, caller: &dyn Commander, line: &str) -> CommandResult {
        if self.config.debug {
            tracing::info!(caller = caller.name(), line, "dispatching command");
        }
        let context = self.parse(line)?;
        permission::enforce_resolved(&context, caller)?;
        let result = self.dispatcher.executor().execute(caller, &context);
        if let Err(err) = &result {
            tracing::debug!(code = ?err.code(), error = %err, "command failed");
        }
        result
    }

    /// Parses `line` without authorizing or executing it.
    pub fn parse(&self, line: &str) -> Result<ParseContext, CommandError> {
        Ok(parse_line(self.dispatcher.as_ref(), line)?)
    }

    /// Completion candidates for a partial line. Never fails.
    pub fn complete(&self, caller: &dyn Commander, line: &str) -> Vec<String> {
        let mut args = CommandArgs::partial(line);
        let candidates = self
            .dispatcher
            .tab_complete(caller, &mut args, &ParseContext::new());
        tracing::debug!(line, candidates = candidates.len(), "completed line");
        candidates
    }

    /// Top-level usage listing the root names `caller` can see.
    pub fn usage(&self, caller: &dyn Commander) -> String {
        caller.formatter().combined(&self.dispatcher.usage(caller))
    }

    /// Human-readable failure text, with a caret under the offending token for parse errors.
    pub fn render_error(&self, caller: &dyn Commander, err: &CommandError) -> String {
        let message = caller.formatter().translated(err.message());
        match err {
            CommandError::Parse(parse) => format!("{message}\n{}", parse.annotated_position()),
            _ => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{commander::SimpleCommander, generic::string};
    use command_tree_contract::{CommandErrorCode, Message};
    use pretty_assertions::assert_eq;

    fn engine(config: EngineConfig) -> CommandEngine {
        let echo = CommandSpec::builder()
            .aliases(["echo", "say"])
            .arguments(string("word"))
            .executor_fn(|_, args| match args.one_text(&"word".into()) {
                Some("fail") => Err(CommandError::failed(Message::new("refused"))),
                _ => Ok(()),
            })
            .build()
            .expect("build");
        CommandEngine::builder(config).register(echo).build()
    }

    #[test]
    fn root_aliases_include_secondaries() {
        let engine = engine(EngineConfig::default());
        assert_eq!(engine.root_aliases(), vec!["echo", "say"]);
        assert!(engine.root("say").is_some());
    }

    #[test]
    fn dispatch_surfaces_handler_failures() {
        let engine = engine(EngineConfig::default());
        let caller = SimpleCommander::new("console");
        engine.dispatch(&caller, "say hi").expect("dispatch");
        let err = engine.dispatch(&caller, "echo fail").expect_err("fails");
        assert_eq!(err.code(), CommandErrorCode::Failed);
    }

    #[test]
    fn render_error_translates_and_points_at_token() {
        let mut config = EngineConfig::default();
        config
            .messages
            .insert("Unknown subcommand %s", "Sous-commande inconnue %s");
        let engine = engine(config);
        let caller = SimpleCommander::new("console").with_formatter(engine.formatter());
        let err = engine.dispatch(&caller, "nope").expect_err("unknown");
        assert_eq!(err.code(), CommandErrorCode::NotFound);
        assert_eq!(
            engine.render_error(&caller, &err),
            "Sous-commande inconnue nope\nnope\n^"
        );
    }
}
