//! Command registry.
//!
//! Holds every user command in registration order. The built-in `help` and
//! hidden `_completion` commands are not stored: [`builtin_entries`] rebuilds
//! them each time the dispatcher assembles its table.

pub mod command;
pub mod signature;

pub use command::{Command, CommandEntry, Handler};
pub(crate) use command::Action;
pub use signature::{Param, Signature, guess_usage};

use tracing::debug;

use crate::error::{DispatchError, Result};
use crate::option::{OptSpec, OptionKind};

pub const HELP_COMMAND: &str = "help";
pub const COMPLETION_COMMAND: &str = "_completion";

const HELP_DOC: &str = "Show help for a given help topic or a help overview

With no arguments, print a list of commands with short help messages.

Given a command name, print help for that command.";

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<CommandEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a command.
    ///
    /// Fails if any of its names is reserved for a built-in or already taken.
    pub fn register(&mut self, command: Command) -> Result<()> {
        let entry = command.build()?;
        for name in entry.names() {
            if name == HELP_COMMAND || name == COMPLETION_COMMAND {
                return Err(DispatchError::configuration(format!(
                    "Command name '{name}' is reserved"
                )));
            }
            if let Some(owner) = self.find_exact(name) {
                return Err(DispatchError::configuration(format!(
                    "Command name '{name}' is already used by '{}'",
                    owner.name()
                )));
            }
        }
        debug!(command = entry.name(), aliases = ?entry.aliases(), "registered command");
        self.entries.push(entry);
        Ok(())
    }

    pub fn entries(&self) -> &[CommandEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_exact(&self, name: &str) -> Option<&CommandEntry> {
        self.entries.iter().find(|e| e.answers_to(name))
    }
}

/// Fresh `help` and `_completion` entries.
pub(crate) fn builtin_entries() -> [CommandEntry; 2] {
    let help = Command::with_action(HELP_COMMAND, Action::Help)
        .doc(HELP_DOC)
        .usage("%name [TOPIC]")
        .optional_arg("topic")
        .assemble();

    let completion = Command::with_action(COMPLETION_COMMAND, Action::CompletionScript)
        .doc("Outputs completion script for bash or zsh.")
        .option(
            OptSpec::new(
                "t",
                "type",
                OptionKind::text("bash"),
                "Completion type (bash or zsh)",
            )
            .with_completer(|partial| {
                ["bash", "zsh"]
                    .into_iter()
                    .filter(|shell| shell.starts_with(partial))
                    .map(str::to_string)
                    .collect()
            }),
        )
        .hidden()
        .assemble();

    [help, completion]
}
