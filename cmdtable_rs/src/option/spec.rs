//! Declaration of a single option.

use std::fmt;
use std::sync::Arc;

use super::kind::OptionKind;
use crate::error::{DispatchError, Result};
use crate::invoke::REST_KEY;

/// Produces shell-completion candidates for an option's value.
pub type Completer = Arc<dyn Fn(&str) -> Vec<String> + Send + Sync>;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true",
    "type", "unsafe", "use", "where", "while", "yield",
];

/// One flag: `-x` / `--long-name`, its kind and default, and help text.
#[derive(Clone)]
pub struct OptSpec {
    short: String,
    long: String,
    kind: OptionKind,
    help: String,
    completer: Option<Completer>,
}

impl OptSpec {
    /// Declare an option. Pass `""` as `short` for a long-only option.
    ///
    /// Names are checked when the option is registered, not here.
    pub fn new(
        short: impl Into<String>,
        long: impl Into<String>,
        kind: OptionKind,
        help: impl Into<String>,
    ) -> Self {
        Self {
            short: short.into(),
            long: long.into(),
            kind,
            help: help.into(),
            completer: None,
        }
    }

    /// Attach a completer used when the shell completes this option's value.
    pub fn with_completer<F>(mut self, completer: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + Send + Sync + 'static,
    {
        self.completer = Some(Arc::new(completer));
        self
    }

    pub fn short(&self) -> Option<char> {
        self.short.chars().next()
    }

    pub fn long(&self) -> &str {
        &self.long
    }

    pub fn kind(&self) -> &OptionKind {
        &self.kind
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn completer(&self) -> Option<&Completer> {
        self.completer.as_ref()
    }

    /// Identifier under which the parsed value is stored and bound.
    pub fn ident(&self) -> String {
        to_identifier(&self.long)
    }

    /// Textual forms accepted on the command line: `-x` (if any) and `--long`.
    pub fn flag_forms(&self) -> Vec<String> {
        let mut forms = Vec::with_capacity(2);
        if let Some(c) = self.short() {
            forms.push(format!("-{c}"));
        }
        forms.push(format!("--{}", self.long));
        forms
    }

    /// Whether `other` would collide with this option on the command line.
    pub(crate) fn clashes_with(&self, other: &OptSpec) -> bool {
        self.long == other.long || (self.short().is_some() && self.short() == other.short())
    }

    fn validate(&self) -> Result<()> {
        if self.short.chars().count() > 1 {
            return Err(DispatchError::configuration(format!(
                "Short option should be only a single character: {}",
                self.short
            )));
        }
        if self.long.is_empty() {
            return Err(DispatchError::configuration(
                "Long name should be defined for every option",
            ));
        }
        if self.long.starts_with('-') || self.long.contains(char::is_whitespace) {
            return Err(DispatchError::configuration(format!(
                "Long name must not start with '-' or contain whitespace: {}",
                self.long
            )));
        }
        if self.short == "-" {
            return Err(DispatchError::configuration("Short option cannot be '-'"));
        }
        if self.ident() == REST_KEY {
            return Err(DispatchError::configuration(format!(
                "Option --{} would shadow the variadic arguments",
                self.long
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for OptSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptSpec")
            .field("short", &self.short)
            .field("long", &self.long)
            .field("kind", &self.kind)
            .field("help", &self.help)
            .field("completer", &self.completer.is_some())
            .finish()
    }
}

/// Validate an option list as one command would see it.
///
/// Fails on malformed names and on long or short names used twice.
pub fn validate_options(options: &[OptSpec]) -> Result<()> {
    for (i, option) in options.iter().enumerate() {
        option.validate()?;
        if let Some(prev) = options[..i].iter().find(|prev| prev.clashes_with(option)) {
            return Err(DispatchError::configuration(format!(
                "Option --{} clashes with --{}",
                option.long, prev.long
            )));
        }
    }
    Ok(())
}

/// A command's own options followed by every global option it does not already define.
pub fn merge_globals(own: &[OptSpec], globals: &[OptSpec]) -> Vec<OptSpec> {
    let mut merged = own.to_vec();
    for global in globals {
        if !own.iter().any(|o| o.clashes_with(global)) {
            merged.push(global.clone());
        }
    }
    merged
}

/// Convert an option name into identifier form: `pid-file` -> `pid_file`, `type` -> `type_`.
pub fn to_identifier(name: &str) -> String {
    let ident = name.replace('-', "_");
    if RUST_KEYWORDS.contains(&ident.as_str()) {
        format!("{ident}_")
    } else {
        ident
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opt(short: &str, long: &str) -> OptSpec {
        OptSpec::new(short, long, OptionKind::Flag(false), "")
    }

    #[test]
    fn test_identifier_form() {
        assert_eq!(to_identifier("pid-file"), "pid_file");
        assert_eq!(to_identifier("listen"), "listen");
        assert_eq!(to_identifier("type"), "type_");
    }

    #[test]
    fn test_short_name_longer_than_one_char_is_rejected() {
        let err = validate_options(&[opt("ab", "all")]).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert!(err.to_string().contains("single character"));
    }

    #[test]
    fn test_rest_identifier_is_rejected() {
        let err = validate_options(&[opt("r", "rest")]).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
        assert!(err.to_string().contains("--rest"));
    }

    #[test]
    fn test_missing_long_name_is_rejected() {
        let err = validate_options(&[opt("a", "")]).unwrap_err();
        assert!(err.to_string().contains("Long name should be defined"));
    }

    #[test]
    fn test_duplicate_long_name_is_rejected() {
        let err = validate_options(&[opt("a", "all"), opt("", "all")]).unwrap_err();
        assert!(matches!(err, DispatchError::Configuration(_)));
    }

    #[test]
    fn test_valid_options_pass() {
        assert!(validate_options(&[opt("a", "all"), opt("", "brief"), opt("", "color")]).is_ok());
    }

    #[test]
    fn test_flag_forms() {
        assert_eq!(opt("l", "listen").flag_forms(), vec!["-l", "--listen"]);
        assert_eq!(opt("", "pid-file").flag_forms(), vec!["--pid-file"]);
    }

    #[test]
    fn test_merge_globals_skips_present_options() {
        let own = vec![opt("h", "host"), opt("", "verbose")];
        let globals = vec![opt("h", "help"), opt("v", "verbose"), opt("q", "quiet")];
        let merged = merge_globals(&own, &globals);
        let names: Vec<&str> = merged.iter().map(OptSpec::long).collect();
        assert_eq!(names, vec!["host", "verbose", "quiet"]);
    }
}
