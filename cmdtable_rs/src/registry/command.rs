//! Command declaration (builder) and the immutable entry it produces.

use std::fmt;
use std::sync::Arc;

use super::signature::{Param, Signature, guess_usage};
use crate::error::{DispatchError, Result};
use crate::invoke::{Args, REST_KEY};
use crate::option::{OptSpec, validate_options};

/// Function run for a command. The returned integer becomes the dispatch result.
pub type Handler = Arc<dyn Fn(&Args) -> anyhow::Result<i32> + Send + Sync>;

/// What dispatching to an entry does.
#[derive(Clone)]
pub(crate) enum Action {
    Run(Handler),
    /// Built-in `help`: renders listings or command help.
    Help,
    /// Built-in `_completion`: prints the shell completion script.
    CompletionScript,
}

/// Builder for one command.
///
/// ```
/// use cmdtable::{Command, OptSpec, OptionKind};
///
/// let serve = Command::new("serve", |args| {
///     println!("listening on {}", args.text("listen").unwrap_or_default());
///     Ok(0)
/// })
/// .alias("s")
/// .doc("start a server")
/// .option(OptSpec::new("l", "listen", OptionKind::text("localhost"), "ip to listen on"));
/// # let _ = serve;
/// ```
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    action: Action,
    doc: String,
    usage: Option<String>,
    options: Vec<OptSpec>,
    params: Vec<Param>,
    variadic: Option<String>,
    shortlist: bool,
    hidden: bool,
}

impl Command {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Args) -> anyhow::Result<i32> + Send + Sync + 'static,
    {
        Self::with_action(name, Action::Run(Arc::new(handler)))
    }

    pub(crate) fn with_action(name: impl Into<String>, action: Action) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            action,
            doc: String::new(),
            usage: None,
            options: Vec::new(),
            params: Vec::new(),
            variadic: None,
            shortlist: false,
            hidden: false,
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Documentation; the first line doubles as the summary in listings.
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = doc.into();
        self
    }

    /// Usage template; `%name` is replaced with the invoked name.
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn option(mut self, option: OptSpec) -> Self {
        self.options.push(option);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = OptSpec>) -> Self {
        self.options.extend(options);
        self
    }

    /// Required positional parameter.
    pub fn arg(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::required(name));
        self
    }

    pub fn optional_arg(mut self, name: impl Into<String>) -> Self {
        self.params.push(Param::optional(name));
        self
    }

    /// Name of the parameter collecting any extra positional values.
    pub fn variadic(mut self, name: impl Into<String>) -> Self {
        self.variadic = Some(name.into());
        self
    }

    /// Show in the brief listing printed when no command is given.
    pub fn shortlist(mut self) -> Self {
        self.shortlist = true;
        self
    }

    /// Dispatchable, but never listed in help.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Validate the declaration and freeze it.
    pub(crate) fn build(self) -> Result<CommandEntry> {
        validate_options(&self.options)?;
        for name in std::iter::once(&self.name).chain(&self.aliases) {
            if name.is_empty() || name.starts_with('-') || name.contains(char::is_whitespace) {
                return Err(DispatchError::configuration(format!(
                    "Invalid command name: '{name}'"
                )));
            }
        }
        let mut seen: Vec<&str> = Vec::new();
        let declared = self
            .params
            .iter()
            .map(Param::name)
            .chain(self.variadic.as_deref());
        for name in declared {
            if name == REST_KEY {
                return Err(DispatchError::configuration(format!(
                    "Parameter name '{REST_KEY}' of command '{}' is reserved",
                    self.name
                )));
            }
            if seen.contains(&name) || self.options.iter().any(|o| o.ident() == name) {
                return Err(DispatchError::configuration(format!(
                    "Parameter '{name}' of command '{}' is declared twice",
                    self.name
                )));
            }
            seen.push(name);
        }
        Ok(self.assemble())
    }

    pub(crate) fn assemble(self) -> CommandEntry {
        let mut params = self.params;
        params.extend(self.options.iter().map(|o| Param::optional(o.ident())));
        let signature = Signature::new(params, self.variadic);
        let usage = self
            .usage
            .unwrap_or_else(|| guess_usage(&signature, &self.options));
        CommandEntry {
            name: self.name,
            aliases: self.aliases,
            action: self.action,
            doc: self.doc,
            usage,
            options: self.options,
            signature,
            shortlist: self.shortlist,
            hidden: self.hidden,
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A registered command. Immutable once built.
#[derive(Clone)]
pub struct CommandEntry {
    name: String,
    aliases: Vec<String>,
    action: Action,
    doc: String,
    usage: String,
    options: Vec<OptSpec>,
    signature: Signature,
    shortlist: bool,
    hidden: bool,
}

impl CommandEntry {
    /// Primary (canonical) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Alternate names, excluding the primary one.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Every name the command answers to, primary first.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn answers_to(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Usage template, still containing `%name`.
    pub fn usage(&self) -> &str {
        &self.usage
    }

    /// The command's own options, without globals.
    pub fn options(&self) -> &[OptSpec] {
        &self.options
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn is_shortlisted(&self) -> bool {
        self.shortlist
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub(crate) fn action(&self) -> &Action {
        &self.action
    }
}

impl fmt::Debug for CommandEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandEntry")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .field("options", &self.options)
            .field("signature", &self.signature)
            .field("shortlist", &self.shortlist)
            .field("hidden", &self.hidden)
            .finish_non_exhaustive()
    }
}
