//! Recursive command-argument parsing and dispatch with permission-aware completion.
//!
//! A command tree is built from [`CommandSpec`] values whose arguments are [`CommandElement`]
//! graphs. Child dispatchers ([`children::child_args`]) resolve subcommands by alias, record the
//! resolved spec under a unique key, and hand the remaining tokens to the child. The same graph
//! serves parsing, tab completion, and usage rendering.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod args;
pub mod children;
pub mod commander;
pub mod config;
pub mod context;
pub mod element;
pub mod engine;
pub mod game;
pub mod generic;
pub mod permission;
pub mod spec;
pub mod subjects;

pub use args::CommandArgs;
pub use children::{child_args, ChildCommandElement, ChildCommandExecutor};
pub use command_tree_contract::{
    ArgumentParseError, CommandError, CommandErrorCode, CommandResult, ContextPair, ElementKey,
    Message, MessageCatalog, ParseErrorKind, SubjectRef,
};
pub use commander::{Commander, MessageFormatter, PlainFormatter, SimpleCommander};
pub use config::{ConfigError, ConfigLoader, EngineConfig, SubjectConfig};
pub use context::{ArgValue, ParseContext};
pub use element::{CommandElement, ElementRef, KeyAllocator};
pub use engine::{CommandEngine, CommandEngineBuilder};
pub use permission::Access;
pub use spec::{CommandExecutor, CommandSpec, CommandSpecBuilder, SpecBuildError};
pub use subjects::{MemorySubjectRegistry, NameTransformer, SubjectRegistry, SubjectStore};
