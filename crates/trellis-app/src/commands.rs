//! Demo command tree.

use std::io::Write;

use anyhow::Context;
use trellis_shell::{Command, Engine, Output};

/// Register the demo commands on `engine`.
pub fn register(engine: &Engine) {
    let root = engine.root();
    let broadcast = engine.broadcast();

    engine.insert(
        root,
        Command::new("hello", |out: &mut Output| writeln!(out, "Hello, world"))
            .help("Print a greeting"),
    );
    engine.insert(
        root,
        Command::new("answer", |out: &mut Output, x: i32| {
            writeln!(out, "The answer is: {x}")
        })
        .help("Print the number you give me"),
    );
    engine.insert(
        root,
        Command::new("add", |out: &mut Output, a: f64, b: f64| {
            writeln!(out, "{a} + {b} = {}", a + b)
        })
        .help("Add two numbers")
        .params(["lhs", "rhs"]),
    );
    engine.insert(
        root,
        Command::freeform("echo", |out: &mut Output, args: Vec<String>| {
            writeln!(out, "{}", args.join(" "))
        })
        .help("Print the arguments"),
    );
    engine.insert(
        root,
        Command::freeform("announce", move |_: &mut Output, words: Vec<String>| {
            writeln!(broadcast.clone(), "[announcement] {}", words.join(" "))
        })
        .help("Send a message to every session"),
    );
    engine.insert(
        root,
        Command::new("port", |out: &mut Output, text: String| -> anyhow::Result<()> {
            let port: u16 = text
                .parse()
                .with_context(|| format!("'{text}' is not a port number"))?;
            anyhow::ensure!(port >= 1024, "port {port} is reserved");
            writeln!(out, "using port {port}")?;
            Ok(())
        })
        .help("Validate a port number")
        .params(["port"]),
    );

    let sub = engine.insert(root, Command::menu("sub").help("A submenu"));
    engine.insert(
        sub.id(),
        Command::new("status", |out: &mut Output| writeln!(out, "all good"))
            .help("Show the submenu status"),
    );

    let net = engine.insert(root, Command::menu("net").help("Network commands"));
    engine.insert(
        net.id(),
        Command::new("show", |out: &mut Output| writeln!(out, "eth0: up"))
            .help("Show interfaces"),
    );

    engine.insert(
        root,
        Command::new("network", move |out: &mut Output, on: bool| {
            if on {
                net.enable();
            } else {
                net.disable();
            }
            writeln!(out, "net menu {}", if on { "enabled" } else { "disabled" })
        })
        .help("Enable or disable the net menu")
        .params(["on"]),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trellis_shell::{Capture, CommandTree, Session, VolatileHistoryStorage};

    use super::*;

    fn demo() -> (Session, Capture) {
        let engine = Engine::new(CommandTree::new("cli"), VolatileHistoryStorage::default());
        register(&engine);
        let (out, capture) = Output::capture();
        (Session::new(Arc::new(engine), out), capture)
    }

    #[test]
    fn network_toggles_net_menu() {
        let (mut session, capture) = demo();
        session.feed("net show");
        session.feed("network false");
        session.feed("net show");
        session.feed("network 1");
        session.feed("net show");
        assert_eq!(
            capture.contents(),
            "eth0: up\nnet menu disabled\nwrong command: net show\nnet menu enabled\neth0: up\n"
        );
    }

    #[test]
    fn port_reports_errors() {
        let (mut session, capture) = demo();
        session.feed("port 80");
        session.feed("port http");
        session.feed("port 8080");
        let text = capture.contents();
        assert!(text.contains("port 80 is reserved\n"));
        assert!(text.contains("'http' is not a port number\n"));
        assert!(text.ends_with("using port 8080\n"));
    }

    #[test]
    fn announce_reaches_sender() {
        let (mut session, capture) = demo();
        session.feed("announce server restarting");
        assert_eq!(capture.contents(), "[announcement] server restarting\n");
    }
}
