//! Shell completion: candidates for the word under the cursor and the
//! scripts that wire a shell up to ask for them.

use tracing::debug;

use crate::config::CompletionEnv;
use crate::error::OptionError;
use crate::invoke::Middleware;
use crate::option::{OptSpec, merge_globals};
use crate::registry::CommandEntry;

/// Exit status after printing candidates. Non-zero, so a completion run is
/// never mistaken for a successful command.
pub const COMPLETION_EXIT_STATUS: i32 = 1;

const BASH_SCRIPT: &str = r#"
# @PROG@ bash completion start
_@FUNC@_completion()
{
    COMPREPLY=( $( @WORDS@="${COMP_WORDS[*]}" \
                   @CWORD@=$COMP_CWORD \
                   @MARKER@=1 $1 ) )
}
complete -o default -F _@FUNC@_completion @PROG@
# @PROG@ bash completion end
"#;

const ZSH_SCRIPT: &str = r#"
# @PROG@ zsh completion start
function _@FUNC@_completion {
  local words cword
  read -Ac words
  read -cn cword
  reply=( $( @WORDS@="$words[*]" \
             @CWORD@=$(( cword-1 )) \
             @MARKER@=1 $words[1] ) )
}
compctl -K _@FUNC@_completion @PROG@
# @PROG@ zsh completion end
"#;

/// One completion query: the command line without the program name, and
/// the cursor position counted with the program name as word 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    words: Vec<String>,
    cword: usize,
}

impl CompletionRequest {
    pub fn new(words: Vec<String>, cword: usize) -> Self {
        Self { words, cword }
    }

    /// Build from the raw environment values. An unreadable index completes nothing.
    pub fn parse(comp_words: &str, comp_cword: &str) -> Self {
        Self {
            words: comp_words
                .split_whitespace()
                .skip(1)
                .map(str::to_string)
                .collect(),
            cword: comp_cword.trim().parse().unwrap_or(0),
        }
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn cword(&self) -> usize {
        self.cword
    }

    /// Partial text under the cursor; empty when the cursor is past the last word.
    pub fn current(&self) -> &str {
        self.word_at(self.cword.checked_sub(1))
    }

    /// Word before the cursor; empty when there is none.
    pub fn previous(&self) -> &str {
        self.word_at(self.cword.checked_sub(2))
    }

    fn word_at(&self, index: Option<usize>) -> &str {
        index
            .and_then(|i| self.words.get(i))
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Candidates for `request`, in output order.
///
/// The first word completes to command names. After a known command, option
/// flags complete; if the previous word is a flag with a completer, its
/// candidates come first.
pub fn complete(
    request: &CompletionRequest,
    table: &[CommandEntry],
    globals: &[OptSpec],
    middleware: Option<&dyn Middleware>,
) -> Vec<String> {
    let current = request.current();
    debug!(cword = request.cword(), current, "completion request");

    match request.cword() {
        0 => Vec::new(),
        1 => table
            .iter()
            .flat_map(|e| e.names())
            .filter(|name| name.starts_with(current))
            .map(str::to_string)
            .collect(),
        _ => {
            let Some(first) = request.words().first() else {
                return Vec::new();
            };
            let Some(entry) = table.iter().find(|e| e.answers_to(first)) else {
                return Vec::new();
            };
            let options = merge_globals(entry.options(), globals);
            let previous = request.previous();

            let mut candidates = Vec::new();
            for option in &options {
                let Some(completer) = option.completer() else {
                    continue;
                };
                if option.flag_forms().iter().any(|form| form == previous) {
                    let run = |partial: &str| completer(partial);
                    candidates.extend(match middleware {
                        Some(middleware) => middleware.complete(option.long(), current, &run),
                        None => run(current),
                    });
                }
            }
            candidates.extend(
                options
                    .iter()
                    .flat_map(OptSpec::flag_forms)
                    .filter(|form| form.starts_with(current)),
            );
            candidates
        }
    }
}

/// Completion script for `shell` (`bash` or `zsh`).
pub fn completion_script(shell: &str, program: &str, env: &CompletionEnv) -> Result<String, OptionError> {
    let template = match shell {
        "bash" => BASH_SCRIPT,
        "zsh" => ZSH_SCRIPT,
        other => {
            return Err(OptionError::InvalidValue {
                value: other.to_string(),
                option: "type".to_string(),
            });
        }
    };
    let func: String = program
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    Ok(template
        .trim()
        .replace("@PROG@", program)
        .replace("@FUNC@", &func)
        .replace("@WORDS@", &env.words)
        .replace("@CWORD@", &env.cword)
        .replace("@MARKER@", &env.marker))
}
