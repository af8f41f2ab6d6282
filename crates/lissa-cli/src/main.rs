//! Lissa CLI - curve workbench with console and plugin input sources.

mod console;
mod render;

use std::rc::Rc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use lissa_core::reactor::EventSource;
use lissa_core::{
    CommandSession, GraphInterpreter, GraphState, HostHooks, PluginKind, PluginSet, Reactor,
};

use console::ConsoleHost;

#[derive(Parser)]
#[command(name = "lissa")]
#[command(about = "Lissajous curve workbench driven by consoles and slider plugins")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive console (default)
    Console,

    /// Launch a slider plugin and pump events until it exits
    Plugin {
        /// Which plugin family to launch
        #[arg(value_enum)]
        kind: KindArg,
    },

    /// Evaluate console lines non-interactively
    Exec {
        /// Lines to submit, in order
        #[arg(short = 'e', required = true)]
        lines: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Tk,
    Tkinter,
}

impl From<KindArg> for PluginKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Tk => PluginKind::Tk,
            KindArg::Tkinter => PluginKind::Tkinter,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        tracing_subscriber::EnvFilter::from_default_env()
            .add_directive(tracing::Level::DEBUG.into())
    } else {
        tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command.unwrap_or(Commands::Console) {
        Commands::Console => run_console(),
        Commands::Plugin { kind } => run_plugin(kind.into()),
        Commands::Exec { lines } => run_exec(&lines),
    }
}

/// Shared wiring for every mode: state, reactor, plugin supervisors, and a
/// session factory whose interpreter can launch plugins.
struct Host {
    state: Rc<GraphState>,
    reactor: Rc<Reactor>,
    plugins: Rc<PluginSet>,
}

impl Host {
    fn new() -> Self {
        let state = Rc::new(GraphState::new());
        let reactor = Rc::new(Reactor::new());
        let plugins = Rc::new(PluginSet::new(&state, &reactor));
        Self {
            state,
            reactor,
            plugins,
        }
    }

    fn make_session(&self) -> CommandSession {
        make_session(&self.state, &self.plugins)
    }
}

fn make_session(state: &Rc<GraphState>, plugins: &Rc<PluginSet>) -> CommandSession {
    let state = Rc::downgrade(state);
    let plugins = Rc::clone(plugins);
    CommandSession::new(move || {
        let hooks = HostHooks {
            launch_plugin: Some(Box::new(move |kind| {
                plugins.launch(kind);
            })),
        };
        Box::new(GraphInterpreter::new(state, hooks))
    })
}

fn run_console() -> anyhow::Result<()> {
    let host = Host::new();
    host.state
        .set_redraw_hook(Box::new(|p| println!("{}", render::status_line(p))));

    // each %switch session gets its own interpreter over the same state
    let factory = {
        let state = Rc::clone(&host.state);
        let plugins = Rc::clone(&host.plugins);
        move || make_session(&state, &plugins)
    };

    let console = Rc::new(
        ConsoleHost::new(Rc::downgrade(&host.state), Box::new(factory))
            .context("failed to set up stdin console")?,
    );
    host.reactor.register(
        libc::STDIN_FILENO,
        Rc::clone(&console) as Rc<dyn EventSource>,
    );
    console.greet();

    while !console.done() {
        host.reactor
            .poll_once(Some(Duration::from_millis(200)))
            .context("reactor wait failed")?;
    }

    // teardown order: plugins first, then sessions, then the state they share
    host.plugins.stop_all();
    console.close();
    Ok(())
}

fn run_plugin(kind: PluginKind) -> anyhow::Result<()> {
    let host = Host::new();
    host.state
        .set_redraw_hook(Box::new(|p| println!("{}", render::status_line(p))));

    anyhow::ensure!(host.plugins.launch(kind), "failed to launch {} plugin", kind.label());
    println!("{} plugin running; close its window to exit", kind.label());

    while host.plugins.get(kind).running() {
        host.reactor
            .poll_once(Some(Duration::from_millis(200)))
            .context("reactor wait failed")?;
    }
    Ok(())
}

fn run_exec(lines: &[String]) -> anyhow::Result<()> {
    let host = Host::new();
    let mut session = host.make_session();
    let mut failed = false;

    for line in lines {
        let submission = session.submit(line);
        if !submission.output.is_empty() {
            print!("{}", submission.output);
        }
        if !submission.error.is_empty() {
            eprintln!("{}", submission.error);
            failed = true;
        }
    }
    // resolve any construct left open by the last line
    if session.in_continuation() {
        let submission = session.submit("");
        print!("{}", submission.output);
        if !submission.error.is_empty() {
            eprintln!("{}", submission.error);
            failed = true;
        }
    }

    session.close();
    anyhow::ensure!(!failed, "one or more lines failed");
    Ok(())
}
