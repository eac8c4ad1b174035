//! Demo program for the dispatcher.
//!
//! Registers a few commands whose handlers print what they were called with,
//! so the whole pipeline (resolution, parsing, binding, help, completion) can
//! be tried from a shell:
//!
//! ```bash
//! cmdtable-demo                          # brief listing
//! cmdtable-demo serve -l 0.0.0.0 --pi x  # prefix option, positional NAME
//! cmdtable-demo help netgraph            # command help
//! source <(cmdtable-demo _completion)    # bash completion
//! ```

use cmdtable::{Args, Command, Dispatcher, Middleware, OptSpec, OptionKind};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Logs every handler call and completer lookup.
struct TraceCalls;

impl Middleware for TraceCalls {
    fn call(
        &self,
        command: &str,
        args: &Args,
        next: &dyn Fn(&Args) -> anyhow::Result<i32>,
    ) -> anyhow::Result<i32> {
        debug!(command, bound = ?args.names().collect::<Vec<_>>(), "calling handler");
        let result = next(args);
        debug!(command, ok = result.is_ok(), "handler returned");
        result
    }

    fn complete(&self, option: &str, partial: &str, next: &dyn Fn(&str) -> Vec<String>) -> Vec<String> {
        debug!(option, partial, "completing option value");
        next(partial)
    }
}

#[derive(Serialize)]
struct Echo<'a> {
    command: &'a str,
    args: &'a Args,
}

/// Handler that prints the command name, every bound value and the rest.
fn echo(command: &'static str) -> impl Fn(&Args) -> anyhow::Result<i32> + Send + Sync + 'static {
    move |args: &Args| {
        if args.flag("json") {
            println!("{}", serde_json::to_string_pretty(&Echo { command, args })?);
            return Ok(0);
        }
        println!("command: {command}");
        for (name, value) in args.iter() {
            println!("{name}={value}");
        }
        if !args.rest().is_empty() {
            println!("rest: {}", args.rest_text().join(" "));
        }
        Ok(0)
    }
}

fn prefixed(choices: &'static [&'static str]) -> impl Fn(&str) -> Vec<String> + Send + Sync + 'static {
    move |partial: &str| {
        choices
            .iter()
            .filter(|c| c.starts_with(partial))
            .map(|c| c.to_string())
            .collect()
    }
}

fn build() -> cmdtable::Result<Dispatcher> {
    let mut app = Dispatcher::new();

    app.global_option(OptSpec::new(
        "q",
        "quiet",
        OptionKind::Flag(false),
        "suppress non-essential output",
    ))?;
    app.global_option(OptSpec::new(
        "",
        "json",
        OptionKind::Flag(false),
        "print bound values as JSON",
    ))?;

    app.register(Command::new("start", echo("start")).doc("start the service"))?;
    app.register(Command::new("stop", echo("stop")).doc("stop the service"))?;
    app.register(
        Command::new("status", echo("status"))
            .alias("st")
            .doc("show service status")
            .shortlist(),
    )?;

    app.register(
        Command::new("serve", echo("serve"))
            .doc(
                "start a server

                Listens on the given address until interrupted. NAME picks
                the site to serve; all sites are served when it is omitted.",
            )
            .option(OptSpec::new("l", "listen", OptionKind::text("localhost"), "ip to listen on"))
            .option(OptSpec::new("p", "port", OptionKind::Int(8000), "port to listen on"))
            .option(OptSpec::new("d", "daemonize", OptionKind::Flag(false), "daemonize process"))
            .option(OptSpec::new(
                "",
                "pid-file",
                OptionKind::text(""),
                "name of file to write process ID to",
            ))
            .option(OptSpec::new(
                "D",
                "define",
                OptionKind::mapping(Vec::<(String, String)>::new()),
                "template variable, as KEY=VALUE",
            ))
            .option(OptSpec::new(
                "I",
                "include",
                OptionKind::list(Vec::<String>::new()),
                "extra directory to serve",
            ))
            .optional_arg("name")
            .shortlist(),
    )?;

    app.register(
        Command::new("netgraph", echo("netgraph"))
            .alias("ng")
            .doc("convert netstat dumps into a connection graph")
            .option(OptSpec::new("o", "output", OptionKind::text("output/graph.db"), "graph database to write"))
            .option(OptSpec::new(
                "c",
                "network-cache",
                OptionKind::text("networks.txt"),
                "file caching known networks",
            ))
            .option(OptSpec::new("v", "verbose", OptionKind::Counter(0), "more progress output"))
            .variadic("files"),
    )?;

    app.register(
        Command::new("pca", echo("pca"))
            .doc("project feature vectors onto principal components")
            .option(OptSpec::new("n", "components", OptionKind::Int(2), "number of components"))
            .option(OptSpec::new("o", "output", OptionKind::text("pca.png"), "plot to write"))
            .arg("input"),
    )?;

    app.register(
        Command::new("classify", echo("classify"))
            .doc("classify request logs")
            .option(
                OptSpec::new("m", "model", OptionKind::text("mlp"), "classifier to use")
                    .with_completer(prefixed(&["mlp", "svm", "tree"])),
            )
            .option(OptSpec::new("t", "threshold", OptionKind::Float(0.5), "decision threshold"))
            .option(OptSpec::new("f", "feature", OptionKind::list(["rate"]), "feature to extract"))
            .variadic("logs"),
    )?;

    app.set_middleware(TraceCalls);
    Ok(app)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let app = build()?;
    let outcome = app.run()?;
    std::process::exit(outcome.exit_code());
}
