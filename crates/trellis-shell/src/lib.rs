//! Embeddable interactive command engine.
//!
//! Commands live in a shared [`CommandTree`] of menus and typed commands.
//! A [`Session`] feeds text lines into the tree: each line is tokenized,
//! matched against the session's built-in commands, then against the current
//! menu and its ancestors, and the first matching handler runs with the
//! session's [`Output`]. The [`Engine`] owns the tree, the persistent history
//! store and the [`Broadcast`] sink shared by all sessions.

mod binding;
mod completion;
mod engine;
mod handle;
mod history;
mod output;
mod session;
mod storage;
mod tokenize;
mod tree;

/// Conversion from a command-line token into a typed argument.
pub use binding::FromToken;
/// A closure usable as a typed command handler.
pub use binding::Handler;
/// Boxed error returned by failing handlers.
pub use binding::HandlerError;
/// Return types accepted from handlers (`()` or `Result<(), E>`).
pub use binding::IntoCommandResult;
/// Owner of the command tree, history store and broadcast sink.
pub use engine::Engine;
/// Revocable reference to a registered command.
pub use handle::CommandHandle;
/// Bounded, navigable command history.
pub use history::History;
/// Fan-out sink replicating writes to every session.
pub use output::Broadcast;
/// In-memory sink for capturing session output.
pub use output::Capture;
/// Shared output sink handed to handlers.
pub use output::Output;
/// One interactive connection.
pub use session::Session;
/// File-backed persistent history.
pub use storage::FileHistoryStorage;
/// Persistent history store contract.
pub use storage::HistoryStorage;
/// In-memory persistent history.
pub use storage::VolatileHistoryStorage;
/// Split a command line into tokens.
pub use tokenize::tokenize;
/// Unattached command or menu, ready to be inserted.
pub use tree::Command;
/// Arena of command nodes.
pub use tree::CommandTree;
/// Generation-checked identifier of a tree node.
pub use tree::NodeId;
