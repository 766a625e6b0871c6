use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use minnow::{run_with, Environment, Locatable, Tokenizer};

/// Runs minnow scripts, or starts an interactive session when no script is
/// given.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Scripts to run in order, sharing one global environment.
    files: Vec<PathBuf>,

    /// Show the global bindings after every line in the interactive session.
    #[arg(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let tokenizer = Tokenizer::new().context("failed to compile token rules")?;
    if args.files.is_empty() {
        run_repl(&tokenizer, args.debug)
    } else {
        run_scripts(&tokenizer, &args.files)
    }
}

/// Installs a stderr subscriber, but only when `RUST_LOG` asks for one.
fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
            .with(EnvFilter::from_default_env())
            .init();
    }
}

fn run_scripts(tokenizer: &Tokenizer, paths: &[PathBuf]) -> anyhow::Result<()> {
    let mut environment = Environment::new();
    for path in paths {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        tracing::debug!(path = %path.display(), "running script");
        if let Err(e) = run_with(tokenizer, &source, &mut environment) {
            match e.location(&source) {
                Some(location) => bail!("{}, {location}: {e}", path.display()),
                None => bail!("{}: {e}", path.display()),
            }
        }
    }
    Ok(())
}

fn run_repl(tokenizer: &Tokenizer, mut debug: bool) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new().context("failed to start line editor")?;
    let mut environment = Environment::new();
    #[cfg(feature = "with-file-history")]
    if rl.load_history("history.txt").is_err() {
        println!("No previous history.");
    }
    loop {
        let readline = rl.readline(">> ");
        match readline {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match line.trim() {
                    "exit" | "quit" => break,
                    "debug" => {
                        debug = !debug;
                        println!("debugger is {}.", if debug { "on" } else { "off" });
                        if debug {
                            dump(&environment);
                        }
                        continue;
                    }
                    _ => {}
                }
                if let Err(e) = run_with(tokenizer, &line, &mut environment) {
                    match e.location(&line) {
                        Some(location) => println!("Error at {location}: {e}"),
                        None => println!("Error: {e}"),
                    }
                }
                if debug {
                    dump(&environment);
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                println!("Error: {err:?}");
                break;
            }
        }
    }
    #[cfg(feature = "with-file-history")]
    rl.save_history("history.txt")
        .context("failed to save history")?;
    Ok(())
}

fn dump(environment: &Environment) {
    let mut bindings: Vec<_> = environment.local_bindings().iter().collect();
    bindings.sort_by(|a, b| a.0.cmp(b.0));
    for (name, value) in bindings {
        println!("  {name} = {value}");
    }
}
