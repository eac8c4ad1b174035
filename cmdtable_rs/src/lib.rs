//! # cmdtable
//!
//! **Subcommand dispatch from a declarative command table.**
//!
//! Register commands with their options, aliases and positional parameters;
//! `cmdtable` parses argv with GNU getopt rules, picks the command by exact
//! name, alias or unique prefix, binds the values and calls the handler. Help
//! text and shell completion come from the same registration.
//!
//! ## Features
//!
//! - **Typed options** - flags, counters, numbers, text, lists, `KEY=VALUE` maps, lazy factories
//! - **Forgiving names** - `st` finds `status`, `--pi` finds `--pid-file`
//! - **Two-phase parsing** - global flags may precede the command name
//! - **Help** - listings, per-command usage, aligned and wrapped option tables
//! - **Completion** - bash/zsh scripts plus an environment-driven completion mode
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cmdtable::{Command, Dispatcher, OptSpec, OptionKind};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut app = Dispatcher::new();
//!     app.register(
//!         Command::new("serve", |args| {
//!             println!("serving on {}:{}", args.text("listen").unwrap_or_default(),
//!                 args.int("port").unwrap_or_default());
//!             Ok(0)
//!         })
//!         .doc("start a server")
//!         .option(OptSpec::new("l", "listen", OptionKind::text("localhost"), "ip to listen on"))
//!         .option(OptSpec::new("p", "port", OptionKind::Int(8000), "port to listen on")),
//!     )?;
//!
//!     let outcome = app.run()?;
//!     std::process::exit(outcome.exit_code());
//! }
//! ```

// ============================================================================
// Parsing
// ============================================================================

pub mod error;
pub mod getopt;
pub mod option;
pub mod process;

// ============================================================================
// Commands
// ============================================================================

pub mod invoke;
pub mod registry;
pub mod resolve;

// ============================================================================
// Output and entry points
// ============================================================================

pub mod complete;
pub mod config;
pub mod dispatch;
pub mod help;

pub use complete::{COMPLETION_EXIT_STATUS, CompletionRequest};
pub use config::{CompletionEnv, DispatcherConfig, RunMode};
pub use dispatch::{Dispatcher, HANDLED_FAILURE, Outcome};
pub use error::{BindError, DispatchError, OptionError, Result};
pub use invoke::{Args, Middleware};
pub use option::{OptSpec, OptionKind, OptionState, OptionValue};
pub use registry::{Command, CommandEntry, Registry};
