//! Dispatcher configuration and run-mode detection.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::complete::CompletionRequest;

/// Environment variables of the shell completion protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionEnv {
    /// Presence switches the program into completion mode.
    pub marker: String,
    /// Whole command line, program name first.
    pub words: String,
    /// Index of the word under the cursor (program name is 0).
    pub cword: String,
}

impl Default for CompletionEnv {
    fn default() -> Self {
        Self {
            marker: "CMDTABLE_AUTO_COMPLETE".to_string(),
            words: "COMP_WORDS".to_string(),
            cword: "COMP_CWORD".to_string(),
        }
    }
}

/// Settings shared by every dispatch of one [`crate::Dispatcher`].
///
/// Deserializable, so a host program can keep it in its own config file;
/// missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Name shown in usage lines and completion scripts.
    pub program: String,
    /// Total column budget for the option table.
    pub help_width: usize,
    pub completion: CompletionEnv,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        let argv0 = std::env::args().next().unwrap_or_default();
        Self {
            program: program_name(&argv0),
            help_width: 78,
            completion: CompletionEnv::default(),
        }
    }
}

impl DispatcherConfig {
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_help_width(mut self, width: usize) -> Self {
        self.help_width = width;
        self
    }

    pub fn with_completion_env(mut self, completion: CompletionEnv) -> Self {
        self.completion = completion;
        self
    }
}

/// Display name for `argv0`: the file name of a path, without a leading `./`.
pub fn program_name(argv0: &str) -> String {
    let trimmed = argv0.strip_prefix("./").unwrap_or(argv0);
    if trimmed.contains('/') {
        Path::new(trimmed)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| trimmed.to_string())
    } else {
        trimmed.to_string()
    }
}

/// What a process run does; decided once, before any parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Dispatch,
    Complete(CompletionRequest),
}

impl RunMode {
    /// Inspect the process environment.
    pub fn detect(env: &CompletionEnv) -> Self {
        Self::from_lookup(env, |name| std::env::var(name).ok())
    }

    /// Same as [`RunMode::detect`] with an explicit variable lookup.
    pub fn from_lookup<F>(env: &CompletionEnv, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if lookup(&env.marker).is_none() {
            return RunMode::Dispatch;
        }
        let words = lookup(&env.words).unwrap_or_default();
        let cword = lookup(&env.cword).unwrap_or_default();
        RunMode::Complete(CompletionRequest::parse(&words, &cword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_program_name() {
        assert_eq!(program_name("/usr/local/bin/netgraph"), "netgraph");
        assert_eq!(program_name("./netgraph"), "netgraph");
        assert_eq!(program_name("netgraph"), "netgraph");
        assert_eq!(program_name("target/debug/netgraph"), "netgraph");
    }

    #[test]
    fn test_run_mode_without_marker() {
        let env = CompletionEnv::default();
        let mode = RunMode::from_lookup(&env, |_| None);
        assert_eq!(mode, RunMode::Dispatch);
    }

    #[test]
    fn test_run_mode_with_marker() {
        let env = CompletionEnv::default();
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CMDTABLE_AUTO_COMPLETE", "1"),
            ("COMP_WORDS", "prog st"),
            ("COMP_CWORD", "1"),
        ]);
        let mode = RunMode::from_lookup(&env, |name| vars.get(name).map(|v| v.to_string()));
        match mode {
            RunMode::Complete(request) => {
                assert_eq!(request.current(), "st");
                assert_eq!(request.cword(), 1);
            }
            other => panic!("expected completion mode, got {other:?}"),
        }
    }

    #[test]
    fn test_config_builders() {
        let config = DispatcherConfig::default()
            .with_program("netgraph")
            .with_help_width(100);
        assert_eq!(config.program, "netgraph");
        assert_eq!(config.help_width, 100);
        assert_eq!(config.completion.marker, "CMDTABLE_AUTO_COMPLETE");
    }

    #[test]
    fn test_partial_config_from_json() {
        let config: DispatcherConfig = serde_json::from_str(
            r#"{"program": "netgraph", "completion": {"marker": "NETGRAPH_COMPLETE"}}"#,
        )
        .unwrap();
        assert_eq!(config.program, "netgraph");
        assert_eq!(config.help_width, 78);
        assert_eq!(config.completion.marker, "NETGRAPH_COMPLETE");
        assert_eq!(config.completion.words, "COMP_WORDS");
    }
}
