//! Interactive sessions: one per console or connection.

use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::binding::HandlerError;
use crate::engine::Engine;
use crate::history::History;
use crate::output::Output;
use crate::tokenize::tokenize;
use crate::tree::{Builtin, Command, CommandTree, Dispatch, NodeId};

/// Why a command line did not run to completion.
#[derive(Debug, thiserror::Error)]
pub(crate) enum DispatchError {
    #[error("no command matched")]
    NoMatch,

    #[error("{0}")]
    Handler(HandlerError),
}

/// Per-connection shell state: current menu, history and output.
///
/// A front-end feeds complete lines with [`feed`](Self::feed) and calls
/// [`prompt`](Self::prompt) between them. The session's output is registered
/// with the engine's broadcast for as long as the session lives.
pub struct Session {
    engine: Arc<Engine>,
    current: NodeId,
    global: CommandTree,
    out: Output,
    exit_action: Box<dyn FnMut(&mut Output) + Send>,
    history: History,
}

impl Session {
    /// Open a session on `engine` writing to `out`, starting at the root
    /// menu with history seeded from the engine's store.
    pub fn new(engine: Arc<Engine>, out: Output) -> Self {
        let config = engine.config();
        let mut global = CommandTree::new("");
        let root = global.root();
        global.insert(
            root,
            Command::builtin("help", Builtin::Help).help("This help message"),
        );
        global.insert(
            root,
            Command::builtin("exit", Builtin::Exit).help("Quit the session"),
        );
        if config.history_command {
            global.insert(
                root,
                Command::builtin("history", Builtin::History).help("Show the history"),
            );
        }

        let mut history = History::new(config.history_capacity);
        history.load(&engine.load_history());
        engine.broadcast().register(&out);
        let current = engine.root();
        log::debug!("session opened with {} history entries", history.len());

        Self {
            engine,
            current,
            global,
            out,
            exit_action: Box::new(|_| {}),
            history,
        }
    }

    /// Process one command line.
    ///
    /// Blank lines are ignored. Anything else is recorded in the history and
    /// dispatched; failures are reported on the session output. A panic
    /// anywhere in the dispatch step, including argument conversion, exit
    /// actions and the engine error handler, is reported and does not leave
    /// this call.
    pub fn feed(&mut self, line: &str) {
        let tokens = tokenize(line);
        if tokens.is_empty() {
            return;
        }
        self.history.push(line);

        let reported = panic::catch_unwind(AssertUnwindSafe(|| self.run_line(line, &tokens)))
            .unwrap_or_else(|_| {
                log::error!("command '{line}' panicked");
                writeln!(
                    self.out,
                    "Unknown error caught handling command line \"{line}\""
                )
            });
        if let Err(e) = reported {
            log::warn!("failed to write to session output: {e}");
        }
    }

    /// Run the exit sequence: the session's exit action, the engine's exit
    /// action, then persist this session's history (replacing what the
    /// store held).
    ///
    /// History is persisted even if an exit action panics; the panic is
    /// resumed afterwards.
    pub fn exit(&mut self) {
        log::debug!("session exiting");
        let finished = panic::catch_unwind(AssertUnwindSafe(|| {
            (self.exit_action)(&mut self.out);
            self.engine.run_exit_action(&mut self.out);
        }));
        self.engine.store_history(&self.history.commands());
        if let Err(payload) = finished {
            panic::resume_unwind(payload);
        }
    }

    /// Write the commands reachable from the current menu.
    pub fn help(&mut self) -> io::Result<()> {
        writeln!(self.out, "Commands available:")?;
        self.global.write_menu_help(self.global.root(), &mut self.out)?;
        let tree = self.engine.read_tree();
        let current = live_menu(&tree, self.current);
        tree.write_menu_help(current, &mut self.out)
    }

    /// Write the prompt for the current menu and flush.
    pub fn prompt(&mut self) -> io::Result<()> {
        let name = self.current_menu_name();
        let config = self.engine.config();
        write!(
            self.out,
            "{}{name}{}> ",
            config.prompt_prefix, config.prompt_suffix
        )?;
        self.out.flush()
    }

    /// Write this session's history, newest first.
    pub fn show_history(&mut self) -> io::Result<()> {
        self.history.show(&mut self.out)
    }

    /// Step back through history. `line` is the text being edited.
    pub fn previous_cmd(&mut self, line: &str) -> String {
        self.history.previous(line)
    }

    /// Step forward through history.
    pub fn next_cmd(&mut self) -> Option<String> {
        self.history.next()
    }

    /// Completion candidates for a partially typed line, sorted and
    /// deduplicated.
    pub fn get_completions(&self, line: &str) -> Vec<String> {
        let line = line.trim_start();
        let mut result = self.global.completions(self.global.root(), line);
        {
            let tree = self.engine.read_tree();
            result.extend(tree.completions(live_menu(&tree, self.current), line));
        }
        result.sort();
        result.dedup();
        result
    }

    /// Run `action` when this session exits, before the engine's action.
    pub fn set_exit_action(&mut self, action: impl FnMut(&mut Output) + Send + 'static) {
        self.exit_action = Box::new(action);
    }

    /// Name of the menu the session is in.
    pub fn current_menu_name(&self) -> String {
        let tree = self.engine.read_tree();
        let current = live_menu(&tree, self.current);
        tree.name(current).unwrap_or_default().to_string()
    }

    /// Id of the menu the session is in.
    pub fn current_menu(&self) -> NodeId {
        live_menu(&self.engine.read_tree(), self.current)
    }

    /// This session's history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The session output sink.
    pub fn output(&mut self) -> &mut Output {
        &mut self.out
    }

    fn run_line(&mut self, line: &str, tokens: &[String]) -> io::Result<()> {
        match self.dispatch(tokens) {
            Ok(()) => Ok(()),
            Err(DispatchError::NoMatch) => writeln!(self.out, "wrong command: {line}"),
            Err(DispatchError::Handler(err)) => {
                log::debug!("command '{line}' failed: {err}");
                self.engine.handle_error(&mut self.out, line, &*err);
                Ok(())
            },
        }
    }

    fn dispatch(&mut self, tokens: &[String]) -> Result<(), DispatchError> {
        log::trace!("dispatching {tokens:?}");
        let found = match self.global.scan(self.global.root(), tokens) {
            Some(found) => Some(found),
            None => {
                let tree = self.engine.read_tree();
                let current = live_menu(&tree, self.current);
                self.current = current;
                tree.scan(current, tokens)
            },
        };

        match found.ok_or(DispatchError::NoMatch)? {
            Dispatch::Navigate(id) => {
                self.current = id;
                log::debug!("entered menu '{}'", self.current_menu_name());
                Ok(())
            },
            Dispatch::Invoke(invocation) => {
                invocation(&mut self.out).map_err(DispatchError::Handler)
            },
            Dispatch::Builtin(builtin) => {
                self.run_builtin(builtin);
                Ok(())
            },
        }
    }

    fn run_builtin(&mut self, builtin: Builtin) {
        let written = match builtin {
            Builtin::Help => self.help(),
            Builtin::History => self.show_history(),
            Builtin::Exit => {
                self.exit();
                Ok(())
            },
        };
        if let Err(e) = written {
            log::warn!("failed to write to session output: {e}");
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.engine.broadcast().unregister(&self.out);
    }
}

/// `current` if it is still in the tree, else the root.
fn live_menu(tree: &CommandTree, current: NodeId) -> NodeId {
    if tree.contains(current) {
        current
    } else {
        log::debug!("current menu is gone, returning to root");
        tree.root()
    }
}
