//! Revocable references to registered commands.

use std::sync::{PoisonError, RwLock, Weak};

use crate::tree::{CommandTree, NodeId};

/// Handle returned when a command is registered with an [`Engine`].
///
/// The handle does not keep the command (or the tree) alive. Every
/// operation is a silent no-op once the command or its menu is gone.
///
/// [`Engine`]: crate::Engine
#[derive(Debug, Clone)]
pub struct CommandHandle {
    tree: Weak<RwLock<CommandTree>>,
    node: NodeId,
    container: NodeId,
}

impl CommandHandle {
    pub(crate) fn new(tree: Weak<RwLock<CommandTree>>, node: NodeId, container: NodeId) -> Self {
        Self {
            tree,
            node,
            container,
        }
    }

    /// Id of the referenced node.
    pub fn id(&self) -> NodeId {
        self.node
    }

    /// Make the command matchable again.
    pub fn enable(&self) {
        self.with_tree(|tree| tree.set_enabled(self.node, true));
    }

    /// Hide the command from dispatch, completion and help. Disabling a
    /// menu hides everything beneath it.
    pub fn disable(&self) {
        self.with_tree(|tree| tree.set_enabled(self.node, false));
    }

    /// Erase the command from its menu. Removing twice does nothing.
    pub fn remove(&self) {
        let removed = self.with_tree(|tree| tree.remove(self.node, self.container));
        if removed == Some(true) {
            log::debug!("handle removed {:?}", self.node);
        }
    }

    /// Whether the referenced command still exists.
    pub fn is_alive(&self) -> bool {
        self.tree.upgrade().is_some_and(|tree| {
            tree.read()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(self.node)
        })
    }

    fn with_tree<T>(&self, f: impl FnOnce(&mut CommandTree) -> T) -> Option<T> {
        let tree = self.tree.upgrade()?;
        let mut guard = tree.write().unwrap_or_else(PoisonError::into_inner);
        Some(f(&mut guard))
    }
}

impl Default for CommandHandle {
    fn default() -> Self {
        Self {
            tree: Weak::new(),
            node: NodeId::DANGLING,
            container: NodeId::DANGLING,
        }
    }
}
