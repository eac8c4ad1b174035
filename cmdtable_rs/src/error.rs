//! Error taxonomy for registration and dispatch.
//!
//! Three layers, innermost first:
//!
//! - [`OptionError`] - getopt-style syntax failures and value coercion failures
//! - [`BindError`] - a handler could not be bound to the parsed values
//! - [`DispatchError`] - everything the dispatch boundary knows how to report
//!
//! `DispatchError::Configuration` is the odd one out: it is raised by
//! registration calls and the dispatch boundary never swallows it.

use thiserror::Error;

/// Failure while tokenizing flags or coercing an option value.
///
/// Syntax variants remember the argv index of the offending token so the
/// preparse pass can fence it off with `--` and retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionError {
    #[error("option -{opt} not recognized")]
    ShortNotRecognized { opt: char, index: usize },

    #[error("option -{opt} requires argument")]
    ShortRequiresArgument { opt: char, index: usize },

    #[error("option --{opt} not recognized")]
    LongNotRecognized { opt: String, index: usize },

    #[error("option --{opt} requires argument")]
    LongRequiresArgument { opt: String, index: usize },

    #[error("option --{opt} must not have an argument")]
    LongTakesNoArgument { opt: String, index: usize },

    #[error("option --{opt} not a unique prefix")]
    NotUniquePrefix { opt: String, index: usize },

    #[error("invalid option value '{value}' for option '{option}'")]
    InvalidValue { value: String, option: String },

    #[error("wrong definition: '{value}' (should be in format KEY=VALUE)")]
    MalformedMapping { value: String },

    #[error("cannot build value for option '{option}': {message}")]
    Factory { option: String, message: String },
}

impl OptionError {
    /// Index of the argv token that caused a syntax error.
    ///
    /// Value errors carry no index: the token itself was well-formed.
    pub fn token_index(&self) -> Option<usize> {
        match self {
            OptionError::ShortNotRecognized { index, .. }
            | OptionError::ShortRequiresArgument { index, .. }
            | OptionError::LongNotRecognized { index, .. }
            | OptionError::LongRequiresArgument { index, .. }
            | OptionError::LongTakesNoArgument { index, .. }
            | OptionError::NotUniquePrefix { index, .. } => Some(*index),
            OptionError::InvalidValue { .. }
            | OptionError::MalformedMapping { .. }
            | OptionError::Factory { .. } => None,
        }
    }
}

/// Why parsed values could not be bound to a handler's signature.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error("takes at most {expected} positional arguments but {given} were given")]
    TooManyArguments { expected: usize, given: usize },

    #[error("missing required argument '{0}'")]
    MissingArgument(String),

    #[error("got multiple values for argument '{0}'")]
    MultipleValues(String),
}

/// Errors surfaced by registration and dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Bad command or option declaration. Always fatal.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unknown command: '{name}'")]
    UnknownCommand {
        name: String,
        /// Closest registered alias, if any is close enough to be worth a hint.
        suggestion: Option<String>,
    },

    #[error("command '{name}' is ambiguous:\n    {}", .candidates.join(" "))]
    AmbiguousCommand {
        name: String,
        candidates: Vec<String>,
    },

    /// Handler could not be called with the parsed arguments.
    #[error("{command}: invalid arguments")]
    Parse {
        command: String,
        #[source]
        source: BindError,
    },

    /// Flag syntax or value error, annotated with the command when known.
    #[error("{source}")]
    Options {
        command: Option<String>,
        #[source]
        source: OptionError,
    },
}

impl DispatchError {
    pub fn configuration(message: impl Into<String>) -> Self {
        DispatchError::Configuration(message.into())
    }

    pub(crate) fn options(command: Option<&str>, source: OptionError) -> Self {
        DispatchError::Options {
            command: command.map(str::to_string),
            source,
        }
    }

    /// Whether the dispatch boundary reports this error instead of propagating it.
    pub fn is_handled(&self) -> bool {
        !matches!(self, DispatchError::Configuration(_))
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
