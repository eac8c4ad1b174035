//! Command resolution: locate the command token, then match it against names.
//!
//! Matching priority:
//!
//! 1. exact name of exactly one command
//! 2. names of more than one command start with the token -> ambiguous
//! 3. names of exactly one command start with the token
//! 4. otherwise unknown, with a did-you-mean hint when something is close

use tracing::debug;

use crate::error::{DispatchError, OptionError, Result};
use crate::option::OptSpec;
use crate::process::preparse;
use crate::registry::CommandEntry;

/// Maximum edit distance for a did-you-mean hint.
const SUGGESTION_DISTANCE: usize = 2;

/// Find the command token in `args` using only the global options.
///
/// Returns its index in `args` and its text, or `None` when every positional
/// token is flag-shaped or there is none.
pub fn locate_command(args: &[String], globals: &[OptSpec]) -> std::result::Result<Option<(usize, String)>, OptionError> {
    let positional = preparse(args, globals)?;
    Ok(positional
        .into_iter()
        .find(|p| !p.value.starts_with('-'))
        .map(|p| (p.index, p.value)))
}

/// Resolve `candidate` against `table` (in table order).
pub fn find_command<'a>(candidate: &str, table: &'a [CommandEntry]) -> Result<&'a CommandEntry> {
    let exact: Vec<&CommandEntry> = table.iter().filter(|e| e.answers_to(candidate)).collect();
    if let [only] = exact.as_slice() {
        debug!(candidate, command = only.name(), "exact command match");
        return Ok(*only);
    }

    let mut matched: Vec<(&CommandEntry, &str)> = Vec::new();
    for entry in table {
        if let Some(alias) = entry.names().find(|n| n.starts_with(candidate)) {
            matched.push((entry, alias));
        }
    }

    match matched.as_slice() {
        [] => Err(DispatchError::UnknownCommand {
            name: candidate.to_string(),
            suggestion: suggest(candidate, table),
        }),
        [(entry, alias)] => {
            debug!(candidate, command = entry.name(), alias, "prefix command match");
            Ok(*entry)
        }
        _ => {
            let mut candidates: Vec<String> = matched.iter().map(|(_, a)| a.to_string()).collect();
            candidates.sort();
            Err(DispatchError::AmbiguousCommand {
                name: candidate.to_string(),
                candidates,
            })
        }
    }
}

/// Closest visible command name within [`SUGGESTION_DISTANCE`] edits.
fn suggest(candidate: &str, table: &[CommandEntry]) -> Option<String> {
    table
        .iter()
        .filter(|e| !e.is_hidden())
        .flat_map(|e| e.names())
        .map(|name| (strsim::levenshtein(candidate, name), name))
        .filter(|(distance, _)| *distance <= SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name.to_string())
}
