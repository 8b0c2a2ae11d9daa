//! The engine: owner of the shared command tree and the history store.

use std::error::Error;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use trellis_types::config::ShellConfig;

use crate::handle::CommandHandle;
use crate::output::{Broadcast, Output};
use crate::storage::{FileHistoryStorage, HistoryStorage, VolatileHistoryStorage};
use crate::tree::{Command, CommandTree, NodeId};

type ExitAction = Box<dyn Fn(&mut Output) + Send + Sync>;
type ErrorHandler = Box<dyn Fn(&mut Output, &str, &(dyn Error + Send + Sync)) + Send + Sync>;

/// Process-wide command engine shared by every session.
///
/// Build one, wrap it in an `Arc`, and create a [`Session`] per connection.
///
/// ```
/// use std::io::Write;
/// use std::sync::Arc;
/// use trellis_shell::{Command, CommandTree, Engine, Output, Session, VolatileHistoryStorage};
///
/// let engine = Arc::new(Engine::new(CommandTree::new("cli"), VolatileHistoryStorage::default()));
/// engine.insert(
///     engine.root(),
///     Command::new("hello", |out: &mut Output| writeln!(out, "hi")),
/// );
///
/// let (out, capture) = Output::capture();
/// let mut session = Session::new(Arc::clone(&engine), out);
/// session.feed("hello");
/// assert_eq!(capture.contents(), "hi\n");
/// ```
///
/// [`Session`]: crate::Session
pub struct Engine {
    tree: Arc<RwLock<CommandTree>>,
    history: Mutex<Box<dyn HistoryStorage>>,
    exit_action: Option<ExitAction>,
    error_handler: Option<ErrorHandler>,
    broadcast: Broadcast,
    config: ShellConfig,
}

impl Engine {
    /// Create an engine over `tree` persisting history in `storage`.
    pub fn new(tree: CommandTree, storage: impl HistoryStorage + 'static) -> Self {
        Self {
            tree: Arc::new(RwLock::new(tree)),
            history: Mutex::new(Box::new(storage)),
            exit_action: None,
            error_handler: None,
            broadcast: Broadcast::new(),
            config: ShellConfig::default(),
        }
    }

    /// Create an engine whose history store is chosen by `config`: a file
    /// when `history_file` is set, memory otherwise.
    pub fn from_config(tree: CommandTree, config: ShellConfig) -> Self {
        let engine = match &config.history_file {
            Some(path) => {
                log::info!("persisting history in {}", path.display());
                Self::new(
                    tree,
                    FileHistoryStorage::new(path, config.history_file_limit),
                )
            },
            None => Self::new(
                tree,
                VolatileHistoryStorage::new(config.history_file_limit),
            ),
        };
        engine.with_config(config)
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    /// Run `action` whenever any session exits, after the session's own
    /// exit action.
    pub fn with_exit_action(
        mut self,
        action: impl Fn(&mut Output) + Send + Sync + 'static,
    ) -> Self {
        self.exit_action = Some(Box::new(action));
        self
    }

    /// Route handler errors to `handler` instead of printing them.
    ///
    /// The handler receives the session output, the command line and the
    /// error.
    pub fn with_error_handler(
        mut self,
        handler: impl Fn(&mut Output, &str, &(dyn Error + Send + Sync)) + Send + Sync + 'static,
    ) -> Self {
        self.error_handler = Some(Box::new(handler));
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Writer replicating to every live session.
    pub fn broadcast(&self) -> Broadcast {
        self.broadcast.clone()
    }

    /// Root menu of the command tree.
    pub fn root(&self) -> NodeId {
        self.read_tree().root()
    }

    /// Register `command` under menu `parent`.
    ///
    /// The returned handle is inert if `parent` is not a live menu.
    pub fn insert(&self, parent: NodeId, command: Command) -> CommandHandle {
        let id = self.write_tree().insert(parent, command);
        CommandHandle::new(Arc::downgrade(&self.tree), id, parent)
    }

    /// A handle to an already registered node. Inert for stale ids and for
    /// the root.
    pub fn handle(&self, id: NodeId) -> CommandHandle {
        let container = self.read_tree().parent(id).unwrap_or(NodeId::DANGLING);
        CommandHandle::new(Arc::downgrade(&self.tree), id, container)
    }

    pub(crate) fn read_tree(&self) -> RwLockReadGuard<'_, CommandTree> {
        self.tree.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write_tree(&self) -> RwLockWriteGuard<'_, CommandTree> {
        self.tree.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn load_history(&self) -> Vec<String> {
        let storage = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        match storage.commands() {
            Ok(commands) => commands,
            Err(e) => {
                log::warn!("failed to load history: {e}");
                Vec::new()
            },
        }
    }

    pub(crate) fn store_history(&self, commands: &[String]) {
        let mut storage = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = storage.store(commands) {
            log::warn!("failed to store history: {e}");
        }
    }

    pub(crate) fn run_exit_action(&self, out: &mut Output) {
        if let Some(action) = &self.exit_action {
            action(out);
        }
    }

    pub(crate) fn handle_error(
        &self,
        out: &mut Output,
        line: &str,
        err: &(dyn Error + Send + Sync),
    ) {
        match &self.error_handler {
            Some(handler) => handler(out, line, err),
            None => {
                if let Err(e) = writeln!(out, "{err}") {
                    log::warn!("failed to report command error: {e}");
                }
            },
        }
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("nodes", &self.read_tree().len())
            .field("exit_action", &self.exit_action.is_some())
            .field("error_handler", &self.error_handler.is_some())
            .field("broadcast", &self.broadcast)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn engine() -> Engine {
        Engine::new(CommandTree::new("cli"), VolatileHistoryStorage::default())
    }

    #[test]
    fn insert_returns_live_handle() {
        let engine = engine();
        let handle = engine.insert(engine.root(), Command::menu("net"));
        assert!(handle.is_alive());
        assert_eq!(engine.read_tree().name(handle.id()), Some("net"));
    }

    #[test]
    fn insert_under_stale_parent_gives_inert_handle() {
        let engine = engine();
        let menu = engine.insert(engine.root(), Command::menu("net"));
        menu.remove();
        let handle = engine.insert(menu.id(), Command::menu("wifi"));
        assert!(!handle.is_alive());
    }

    #[test]
    fn handle_lookup_by_id() {
        let engine = engine();
        let net = engine.insert(engine.root(), Command::menu("net")).id();
        let handle = engine.handle(net);
        handle.disable();
        assert_eq!(engine.read_tree().is_enabled(net), Some(false));
        handle.remove();
        assert!(!engine.read_tree().contains(net));
    }

    #[test]
    fn root_handle_cannot_remove_root() {
        let engine = engine();
        engine.handle(engine.root()).remove();
        assert!(engine.read_tree().contains(engine.root()));
    }

    #[test]
    fn handle_outlives_engine() {
        let engine = engine();
        let handle = engine.insert(engine.root(), Command::menu("net"));
        drop(engine);
        handle.disable();
        handle.remove();
        assert!(!handle.is_alive());
    }

    #[test]
    fn history_round_trip() {
        let engine = engine();
        assert!(engine.load_history().is_empty());
        engine.store_history(&["a".to_string(), "b".to_string()]);
        assert_eq!(engine.load_history(), vec!["a", "b"]);
    }

    #[test]
    fn default_error_report() {
        let engine = engine();
        let (mut out, capture) = Output::capture();
        let err: Box<dyn Error + Send + Sync> = "disk full".into();
        engine.handle_error(&mut out, "save", &*err);
        assert_eq!(capture.contents(), "disk full\n");
    }

    #[test]
    fn custom_error_handler() {
        let engine = engine().with_error_handler(|out, line, err| {
            write!(out, "[{line}] {err}").unwrap();
        });
        let (mut out, capture) = Output::capture();
        let err: Box<dyn Error + Send + Sync> = "boom".into();
        engine.handle_error(&mut out, "save now", &*err);
        assert_eq!(capture.contents(), "[save now] boom");
    }

    #[test]
    fn from_config_uses_file_storage() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("history");
        let config = ShellConfig {
            history_file: Some(path.clone()),
            ..ShellConfig::default()
        };
        let engine = Engine::from_config(CommandTree::new("cli"), config);
        engine.store_history(&["persisted".to_string()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "persisted\n");
        assert_eq!(engine.config().history_file.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn exit_action_runs() {
        let engine = engine().with_exit_action(|out| {
            write!(out, "bye").unwrap();
        });
        let (mut out, capture) = Output::capture();
        engine.run_exit_action(&mut out);
        assert_eq!(capture.contents(), "bye");
    }
}
