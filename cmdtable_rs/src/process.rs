//! Option processor: turns argv into positional tokens and typed option state.
//!
//! Two modes share the tokenizer:
//!
//! - [`process`] - strict; any flag error fails the parse
//! - [`preparse`] - permissive; used to find the command name before the
//!   command's own flags are known. An unrecognized flag is fenced off with
//!   `--` and the parse is retried once.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::error::OptionError;
use crate::getopt::{FlagTable, Positional, gnu_getopt};
use crate::option::{OptSpec, OptionState};

/// Parse `args` against `options`.
///
/// Returns the positional tokens in order and the option state seeded from
/// defaults and updated by every flag occurrence.
pub fn process(args: &[String], options: &[OptSpec]) -> Result<(Vec<String>, OptionState), OptionError> {
    let tokens = gnu_getopt(args, &FlagTable::from_options(options))?;

    let mut by_flag: HashMap<String, &OptSpec> = HashMap::new();
    let mut state = OptionState::new();
    for option in options {
        for form in option.flag_forms() {
            by_flag.insert(form, option);
        }
        state.insert(option.ident(), option.kind().initial());
    }

    let mut seen: Vec<String> = Vec::new();
    for occurrence in &tokens.occurrences {
        let Some(option) = by_flag.get(&occurrence.flag) else {
            continue;
        };
        let ident = option.ident();
        trace!(flag = %occurrence.flag, value = ?occurrence.value, "option occurrence");
        if let Some(current) = state.get_mut(&ident) {
            option
                .kind()
                .apply(&ident, current, occurrence.value.as_deref())?;
        }
        if !seen.contains(&ident) {
            seen.push(ident);
        }
    }

    for option in options {
        let ident = option.ident();
        if seen.contains(&ident) {
            continue;
        }
        if let Some(value) = option.kind().finish_unseen(&ident)? {
            state.insert(ident, value);
        }
    }

    Ok((tokens.positional_values(), state))
}

/// Permissive parse that only reports positional tokens.
///
/// Indices in the result refer to `args` as given, even after a retry.
pub fn preparse(args: &[String], options: &[OptSpec]) -> Result<Vec<Positional>, OptionError> {
    let table = FlagTable::from_options(options);
    match gnu_getopt(args, &table) {
        Ok(tokens) => Ok(tokens.positional),
        Err(err) => {
            let Some(fence) = err.token_index() else {
                return Err(err);
            };
            debug!(error = %err, fence, "preparse: fencing off unknown flag and retrying");
            let mut fenced = args.to_vec();
            fenced.insert(fence, "--".to_string());
            let tokens = gnu_getopt(&fenced, &table)?;
            Ok(tokens
                .positional
                .into_iter()
                .map(|p| Positional {
                    index: if p.index > fence { p.index - 1 } else { p.index },
                    value: p.value,
                })
                .collect())
        }
    }
}
