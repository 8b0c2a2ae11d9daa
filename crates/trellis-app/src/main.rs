//! trellis console demo.
//!
//! Reads commands from standard input and runs them against a demo command
//! tree. Type `help` for the list of commands and `exit` to quit. A TOML
//! configuration file can be given as the first argument or through the
//! `TRELLIS_CONFIG` environment variable.

mod commands;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};

use trellis_shell::{CommandTree, Engine, Output, Session};
use trellis_types::config::ShellConfig;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TRELLIS_CONFIG").ok())
    {
        Some(path) => {
            let path = PathBuf::from(path);
            ShellConfig::load(&path)
                .with_context(|| format!("loading config from {}", path.display()))?
        },
        None => ShellConfig::default(),
    };
    log::info!(
        "Starting trellis (history capacity {})",
        config.history_capacity
    );

    let engine = Engine::from_config(CommandTree::new("cli"), config)
        .with_exit_action(|out| {
            let _ = writeln!(out, "Goodbye.");
        });
    commands::register(&engine);
    let engine = Arc::new(engine);

    let mut session = Session::new(Arc::clone(&engine), Output::stdout());
    let done = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&done);
    session.set_exit_action(move |_| flag.store(true, Ordering::SeqCst));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !done.load(Ordering::SeqCst) {
        session.prompt()?;
        match lines.next() {
            Some(line) => session.feed(&line?),
            None => {
                // EOF behaves like `exit`.
                writeln!(session.output())?;
                session.exit();
                break;
            },
        }
    }

    log::info!("Shutting down");
    Ok(())
}
