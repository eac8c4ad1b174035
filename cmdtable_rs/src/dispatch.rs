//! The dispatcher: registry, global options and middleware in one
//! caller-owned value, plus the error boundary that turns dispatch errors
//! into printed diagnostics and a `-1` result.

use std::sync::Arc;

use tracing::debug;

use crate::complete::{COMPLETION_EXIT_STATUS, CompletionRequest, complete, completion_script};
use crate::config::{DispatcherConfig, RunMode};
use crate::error::{DispatchError, Result};
use crate::help::{render_command_help, render_listing, replace_name};
use crate::invoke::{Args, Middleware, invoke};
use crate::option::{OptSpec, OptionKind, merge_globals, validate_options};
use crate::process::process;
use crate::registry::{Action, COMPLETION_COMMAND, Command, CommandEntry, HELP_COMMAND, Registry, builtin_entries};
use crate::resolve::{find_command, locate_command};

/// Result returned by a dispatch that hit a handled error.
pub const HANDLED_FAILURE: i32 = -1;

/// Identifier of the help flag every command accepts.
const HELP_FLAG: &str = "help";

/// `help shortlist` prints the brief listing, unless a command answers to it.
const SHORTLIST_TOPIC: &str = "shortlist";

/// How a process run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A command (or help) ran and returned this value.
    Finished(i32),
    /// Completion candidates were printed instead of dispatching.
    Completed,
}

impl Outcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Finished(code) => *code,
            Outcome::Completed => COMPLETION_EXIT_STATUS,
        }
    }
}

#[derive(Default)]
pub struct Dispatcher {
    registry: Registry,
    globals: Vec<OptSpec>,
    middleware: Option<Arc<dyn Middleware>>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a command. Configuration errors surface here, never at dispatch.
    pub fn register(&mut self, command: Command) -> Result<&mut Self> {
        self.registry.register(command)?;
        Ok(self)
    }

    /// Add an option accepted by every command.
    pub fn global_option(&mut self, option: OptSpec) -> Result<&mut Self> {
        let mut globals = self.globals.clone();
        globals.push(option);
        validate_options(&globals)?;
        self.globals = globals;
        Ok(self)
    }

    /// Wrap every handler call (except `_completion`) and every option completer.
    pub fn set_middleware<M>(&mut self, middleware: M) -> &mut Self
    where
        M: Middleware + 'static,
    {
        self.middleware = Some(Arc::new(middleware));
        self
    }

    /// Global options, with `-h/--help` appended unless one named `help` exists.
    ///
    /// The appended flag drops its short form when a global already uses `-h`.
    pub fn global_options(&self) -> Vec<OptSpec> {
        let mut globals = self.globals.clone();
        if !globals.iter().any(|o| o.long() == HELP_FLAG) {
            let short = if globals.iter().any(|o| o.short() == Some('h')) {
                ""
            } else {
                "h"
            };
            globals.push(OptSpec::new(
                short,
                HELP_FLAG,
                OptionKind::Flag(false),
                "display help",
            ));
        }
        globals
    }

    /// Registered commands followed by the built-in ones.
    pub fn table(&self) -> Vec<CommandEntry> {
        let mut table = self.registry.entries().to_vec();
        table.extend(builtin_entries());
        table
    }

    /// Parse `args` (without the program name), pick a command and run it.
    ///
    /// Handled errors are printed and yield [`HANDLED_FAILURE`]; anything else
    /// (configuration errors, handler errors) is returned.
    pub fn dispatch(&self, args: &[String]) -> anyhow::Result<i32> {
        let table = self.table();
        let globals = self.global_options();
        match self.dispatch_inner(args, &table, &globals) {
            Ok(code) => Ok(code),
            Err(err) => self.report(err, &|command| match command {
                Some(name) => self.print_topic(name, &table, &globals),
                None => print!("{}", render_listing(&self.config.program, &table, false)),
            }),
        }
    }

    fn dispatch_inner(&self, args: &[String], table: &[CommandEntry], globals: &[OptSpec]) -> anyhow::Result<i32> {
        let located = locate_command(args, globals).map_err(|e| DispatchError::options(None, e))?;
        let (entry, rest) = match located {
            Some((index, candidate)) => {
                let entry = find_command(&candidate, table)?;
                debug!(candidate = %candidate, command = entry.name(), "resolved command");
                let mut rest = args.to_vec();
                rest.remove(index);
                (Some(entry), rest)
            }
            None => (None, args.to_vec()),
        };

        let name = entry.map(CommandEntry::name);
        let options = match entry {
            Some(entry) => merge_globals(entry.options(), globals),
            None => globals.to_vec(),
        };
        let (positional, mut state) = process(&rest, &options).map_err(|e| DispatchError::options(name, e))?;

        if state.take_flag(HELP_FLAG) {
            return self.call_help(name, false, table, globals);
        }
        let Some(entry) = entry else {
            return self.call_help(None, true, table, globals);
        };

        let middleware = self.middleware.as_deref();
        match entry.action() {
            Action::Run(handler) => invoke(
                entry.name(),
                entry.signature(),
                positional,
                state,
                handler.as_ref(),
                middleware,
            ),
            Action::Help => {
                let help = |args: &Args| self.show_help(args.text("topic"), false, table, globals);
                invoke(entry.name(), entry.signature(), positional, state, &help, middleware)
            }
            Action::CompletionScript => {
                let script = |args: &Args| self.print_completion_script(args);
                invoke(entry.name(), entry.signature(), positional, state, &script, None)
            }
        }
    }

    /// Run the built-in help the way an explicit `help [TOPIC]` would run.
    fn call_help(
        &self,
        topic: Option<&str>,
        brief: bool,
        table: &[CommandEntry],
        globals: &[OptSpec],
    ) -> anyhow::Result<i32> {
        let help = |args: &Args| self.show_help(args.text("topic"), brief, table, globals);
        let Some(entry) = table.iter().find(|e| e.name() == HELP_COMMAND) else {
            return self.show_help(topic, brief, table, globals);
        };
        let positional = topic.map(str::to_string).into_iter().collect();
        invoke(
            HELP_COMMAND,
            entry.signature(),
            positional,
            Default::default(),
            &help,
            self.middleware.as_deref(),
        )
    }

    fn show_help(
        &self,
        topic: Option<&str>,
        brief: bool,
        table: &[CommandEntry],
        globals: &[OptSpec],
    ) -> anyhow::Result<i32> {
        match topic {
            None => print!("{}", render_listing(&self.config.program, table, brief)),
            Some(name) if name == SHORTLIST_TOPIC && !table.iter().any(|e| e.answers_to(name)) => {
                print!("{}", render_listing(&self.config.program, table, true));
            }
            Some(name) => {
                let entry = find_command(name, table)?;
                let display = format!("{} {}", self.config.program, entry.name());
                print!("{}", self.command_help(entry, &display, globals));
            }
        }
        Ok(0)
    }

    /// Help for `name` if it resolves; resolution errors were already reported.
    fn print_topic(&self, name: &str, table: &[CommandEntry], globals: &[OptSpec]) {
        if let Ok(entry) = find_command(name, table) {
            let display = format!("{} {}", self.config.program, entry.name());
            print!("{}", self.command_help(entry, &display, globals));
        }
    }

    fn command_help(&self, entry: &CommandEntry, display: &str, globals: &[OptSpec]) -> String {
        let usage = replace_name(entry.usage(), display);
        let options = merge_globals(entry.options(), globals);
        render_command_help(entry, &usage, &options, self.config.help_width)
    }

    fn print_completion_script(&self, args: &Args) -> anyhow::Result<i32> {
        let shell = args.text("type_").unwrap_or("bash");
        let script = completion_script(shell, &self.config.program, &self.config.completion)
            .map_err(|e| DispatchError::options(Some(COMPLETION_COMMAND), e))?;
        println!("{script}");
        Ok(0)
    }

    /// Run one registered command as if it were the whole program.
    ///
    /// No name resolution happens; usage lines show the bare program name.
    pub fn run_single(&self, name: &str, args: &[String]) -> anyhow::Result<i32> {
        let Some(entry) = self.registry.find_exact(name) else {
            return Err(DispatchError::configuration(format!("No command named '{name}'")).into());
        };
        let globals = self.global_options();
        let print_help = |_: Option<&str>| {
            print!("{}", self.command_help(entry, &self.config.program, &globals));
        };

        let run = || -> anyhow::Result<i32> {
            let options = merge_globals(entry.options(), &globals);
            let (positional, mut state) =
                process(args, &options).map_err(|e| DispatchError::options(Some(entry.name()), e))?;
            if state.take_flag(HELP_FLAG) {
                print_help(None);
                return Ok(0);
            }
            match entry.action() {
                Action::Run(handler) => invoke(
                    entry.name(),
                    entry.signature(),
                    positional,
                    state,
                    handler.as_ref(),
                    self.middleware.as_deref(),
                ),
                Action::Help | Action::CompletionScript => Err(DispatchError::configuration(
                    format!("'{name}' cannot run standalone"),
                )
                .into()),
            }
        };

        match run() {
            Ok(code) => Ok(code),
            Err(err) => self.report(err, &print_help),
        }
    }

    /// Completion candidates for `request` against the full command table.
    pub fn complete(&self, request: &CompletionRequest) -> Vec<String> {
        complete(
            request,
            &self.table(),
            &self.global_options(),
            self.middleware.as_deref(),
        )
    }

    /// Run the process: complete if the environment asks for it, dispatch otherwise.
    pub fn run(&self) -> anyhow::Result<Outcome> {
        let mode = RunMode::detect(&self.config.completion);
        let args: Vec<String> = std::env::args().skip(1).collect();
        self.run_with(mode, &args)
    }

    pub fn run_with(&self, mode: RunMode, args: &[String]) -> anyhow::Result<Outcome> {
        match mode {
            RunMode::Complete(request) => {
                println!("{}", self.complete(&request).join(" "));
                Ok(Outcome::Completed)
            }
            RunMode::Dispatch => self.dispatch(args).map(Outcome::Finished),
        }
    }

    /// The error boundary: print handled errors, pass everything else on.
    fn report(&self, err: anyhow::Error, print_help: &dyn Fn(Option<&str>)) -> anyhow::Result<i32> {
        let Some(dispatch) = err.downcast_ref::<DispatchError>() else {
            return Err(err);
        };
        debug!(error = %dispatch, "handled dispatch error");
        match dispatch {
            DispatchError::UnknownCommand { name, suggestion } => {
                eprintln!("unknown command: '{name}'");
                if let Some(suggestion) = suggestion {
                    eprintln!("(did you mean '{suggestion}'?)");
                }
            }
            DispatchError::AmbiguousCommand { .. } => eprintln!("{dispatch}"),
            DispatchError::Parse { command, source } => {
                eprintln!("{dispatch}: {source}\n");
                print_help(Some(command.as_str()));
            }
            DispatchError::Options { command, source } => {
                eprintln!("error: {source}\n");
                print_help(command.as_deref());
            }
            DispatchError::Configuration(_) => return Err(err),
        }
        Ok(HANDLED_FAILURE)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("globals", &self.globals)
            .field("middleware", &self.middleware.is_some())
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OptionError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn dispatcher(seen: Arc<Mutex<Vec<Args>>>) -> Dispatcher {
        let mut d = Dispatcher::with_config(DispatcherConfig::default().with_program("prog"));
        let record = move |code: i32| {
            let seen = Arc::clone(&seen);
            move |args: &Args| {
                seen.lock().unwrap().push(args.clone());
                Ok(code)
            }
        };
        d.register(
            Command::new("serve", record(10))
                .option(OptSpec::new("l", "listen", OptionKind::text("localhost"), "ip to listen on"))
                .option(OptSpec::new("p", "port", OptionKind::Int(8000), "port to listen on"))
                .option(OptSpec::new("", "pid-file", OptionKind::text(""), "pid file"))
                .optional_arg("name"),
        )
        .unwrap();
        d.register(Command::new("status", record(20)).alias("st").shortlist())
            .unwrap();
        d.register(Command::new("start", record(30))).unwrap();
        d.register(
            Command::new("fail", |_| Err(anyhow::anyhow!("disk on fire"))),
        )
        .unwrap();
        d.global_option(OptSpec::new("q", "quiet", OptionKind::Flag(false), "be quiet"))
            .unwrap();
        d
    }

    #[test]
    fn test_dispatch_binds_options_and_positionals() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = dispatcher(Arc::clone(&seen));
        let code = d
            .dispatch(&args(&["-q", "serve", "-l", "0.0.0.0", "--pi", "test", "all"]))
            .unwrap();
        assert_eq!(code, 10);
        let seen = seen.lock().unwrap();
        let bound = &seen[0];
        assert_eq!(bound.text("name"), Some("all"));
        assert_eq!(bound.text("listen"), Some("0.0.0.0"));
        assert_eq!(bound.int("port"), Some(8000));
        assert_eq!(bound.text("pid_file"), Some("test"));
        assert!(bound.flag("quiet"));
        assert!(!bound.contains("help"));
    }

    #[test]
    fn test_dispatch_resolves_alias_and_prefix() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = dispatcher(seen);
        assert_eq!(d.dispatch(&args(&["st"])).unwrap(), 20);
        assert_eq!(d.dispatch(&args(&["star"])).unwrap(), 30);
        assert_eq!(d.dispatch(&args(&["se", "x"])).unwrap(), 10);
    }

    #[test]
    fn test_handled_errors_return_sentinel() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = dispatcher(Arc::clone(&seen));
        assert_eq!(d.dispatch(&args(&["s"])).unwrap(), HANDLED_FAILURE);
        assert_eq!(d.dispatch(&args(&["zzz"])).unwrap(), HANDLED_FAILURE);
        assert_eq!(
            d.dispatch(&args(&["serve", "--port", "abc"])).unwrap(),
            HANDLED_FAILURE
        );
        assert_eq!(d.dispatch(&args(&["status", "extra"])).unwrap(), HANDLED_FAILURE);
        assert_eq!(d.dispatch(&args(&["serve", "--bogus"])).unwrap(), HANDLED_FAILURE);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_handler_errors_propagate() {
        let d = dispatcher(Arc::new(Mutex::new(Vec::new())));
        let err = d.dispatch(&args(&["fail"])).unwrap_err();
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn test_nested_dispatch_errors_are_handled() {
        let mut d = dispatcher(Arc::new(Mutex::new(Vec::new())));
        d.register(Command::new("nested", |_| {
            Err(DispatchError::options(
                Some("nested"),
                OptionError::ShortNotRecognized { opt: 'z', index: 0 },
            )
            .into())
        }))
        .unwrap();
        assert_eq!(d.dispatch(&args(&["nested"])).unwrap(), HANDLED_FAILURE);
    }

    #[test]
    fn test_help_paths_return_zero() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = dispatcher(Arc::clone(&seen));
        assert_eq!(d.dispatch(&[]).unwrap(), 0);
        assert_eq!(d.dispatch(&args(&["--help"])).unwrap(), 0);
        assert_eq!(d.dispatch(&args(&["help", "serve"])).unwrap(), 0);
        assert_eq!(d.dispatch(&args(&["serve", "-h"])).unwrap(), 0);
        assert_eq!(d.dispatch(&args(&["help", "nope"])).unwrap(), HANDLED_FAILURE);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_registration_errors_are_configuration_errors() {
        let mut d = Dispatcher::new();
        let err = d
            .register(Command::new("bad", |_| Ok(0)).option(OptSpec::new(
                "ab",
                "all",
                OptionKind::Flag(false),
                "",
            )))
            .unwrap_err();
        assert!(!err.is_handled());
        assert!(d.global_option(OptSpec::new("", "", OptionKind::Flag(false), "")).is_err());
    }

    #[test]
    fn test_global_help_appended_once() {
        let mut d = Dispatcher::new();
        assert_eq!(d.global_options().len(), 1);
        d.global_option(OptSpec::new("?", "help", OptionKind::Flag(false), "usage"))
            .unwrap();
        let globals = d.global_options();
        assert_eq!(globals.len(), 1);
        assert_eq!(globals[0].short(), Some('?'));
    }

    #[test]
    fn test_help_flag_yields_short_form_to_global_option() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher(Arc::clone(&seen));
        d.global_option(OptSpec::new("h", "host", OptionKind::text("localhost"), "remote host"))
            .unwrap();

        let globals = d.global_options();
        let help = globals.iter().find(|o| o.long() == "help").unwrap();
        assert_eq!(help.short(), None);
        assert_eq!(globals.iter().filter(|o| o.short() == Some('h')).count(), 1);

        assert_eq!(d.dispatch(&args(&["serve", "-h", "example.org"])).unwrap(), 10);
        assert_eq!(seen.lock().unwrap()[0].text("host"), Some("example.org"));
        assert_eq!(d.dispatch(&args(&["serve", "--help"])).unwrap(), 0);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_help_shortlist_topic() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut d = dispatcher(Arc::clone(&seen));
        assert_eq!(d.dispatch(&args(&["help", "shortlist"])).unwrap(), 0);

        d.register(Command::new("shortlist", |_| Ok(0))).unwrap();
        assert_eq!(d.dispatch(&args(&["help", "shortlist"])).unwrap(), 0);
        assert_eq!(d.dispatch(&args(&["help", "shortlis"])).unwrap(), 0);
        assert!(seen.lock().unwrap().is_empty());
    }

    struct Counting(AtomicUsize);

    impl Middleware for Counting {
        fn call(
            &self,
            _command: &str,
            args: &Args,
            next: &dyn Fn(&Args) -> anyhow::Result<i32>,
        ) -> anyhow::Result<i32> {
            self.0.fetch_add(1, Ordering::SeqCst);
            next(args)
        }
    }

    #[test]
    fn test_middleware_skips_completion_script() {
        let counter = Arc::new(Counting(AtomicUsize::new(0)));
        let mut d = dispatcher(Arc::new(Mutex::new(Vec::new())));
        d.middleware = Some(counter.clone());
        d.dispatch(&args(&["status"])).unwrap();
        d.dispatch(&args(&["help"])).unwrap();
        d.dispatch(&args(&["_completion", "-t", "zsh"])).unwrap();
        assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_run_single_uses_command_options() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let d = dispatcher(Arc::clone(&seen));
        let code = d.run_single("serve", &args(&["-p", "9000", "box"])).unwrap();
        assert_eq!(code, 10);
        let seen = seen.lock().unwrap();
        assert_eq!(seen[0].int("port"), Some(9000));
        assert_eq!(seen[0].text("name"), Some("box"));
        assert!(d.run_single("nope", &[]).is_err());
    }

    #[test]
    fn test_run_with_completion_mode() {
        let d = dispatcher(Arc::new(Mutex::new(Vec::new())));
        let request = CompletionRequest::parse("prog st", "1");
        assert_eq!(d.complete(&request), vec!["status", "st", "start"]);
        let outcome = d.run_with(RunMode::Complete(request), &[]).unwrap();
        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(outcome.exit_code(), COMPLETION_EXIT_STATUS);
    }
}
