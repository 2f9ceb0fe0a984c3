//! Permission checks for command visibility and execution.

use command_tree_contract::{CommandError, CommandResult, Message};

use crate::{commander::Commander, context::ParseContext, spec::CommandSpec};

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// The caller may use the command.
    Granted,
    /// The caller may not use the command.
    Denied(Message),
}

impl Access {
    /// Whether access was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Checks `caller` against the permission node declared on `spec`.
pub fn check(spec: &CommandSpec, caller: &dyn Commander) -> Access {
    match spec.permission() {
        Some(node) if !caller.has_permission(node) => {
            Access::Denied(Message::new("You do not have permission to use this command!"))
        }
        _ => Access::Granted,
    }
}

/// Whether `spec` should appear in completion and usage output for `caller`.
pub fn is_visible(spec: &CommandSpec, caller: &dyn Commander) -> bool {
    check(spec, caller).is_granted()
}

/// Fails with [`CommandError::PermissionDenied`] when `caller` lacks access to `spec`.
pub fn enforce(spec: &CommandSpec, caller: &dyn Commander) -> CommandResult {
    match check(spec, caller) {
        Access::Granted => Ok(()),
        Access::Denied(message) => {
            tracing::debug!(
                command = ?spec.primary_alias(),
                caller = caller.name(),
                "permission denied"
            );
            Err(CommandError::permission_denied(message))
        }
    }
}

/// Enforces every subcommand resolved during parsing, outermost first.
pub fn enforce_resolved(context: &ParseContext, caller: &dyn Commander) -> CommandResult {
    context
        .resolved_commands()
        .iter()
        .try_for_each(|spec| enforce(spec, caller))
}
