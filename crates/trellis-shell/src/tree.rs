//! Command tree: an arena of menus and commands with dispatch and help.
//!
//! Nodes are addressed by generation-checked [`NodeId`]s. A menu owns its
//! children through the arena; the parent link is a plain id, never an owner.
//! Removing a node frees its slot (and its whole subtree) and bumps the slot
//! generation, so stale ids resolve to nothing.

use std::io::{self, Write};
use std::sync::Arc;

use crate::binding::{self, Binding, Handler, IntoCommandResult, Invocation};
use crate::output::Output;

/// Description given to menus that do not set one.
const DEFAULT_MENU_DESCRIPTION: &str = "(menu)";

/// Identifier of a node in a [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// An id that never resolves to a node.
    pub const DANGLING: NodeId = NodeId {
        index: u32::MAX,
        generation: u32::MAX,
    };
}

/// Session-level commands of the private global menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Builtin {
    Help,
    Exit,
    History,
}

pub(crate) enum NodeKind {
    Menu { children: Vec<NodeId> },
    Leaf(Arc<dyn Binding>),
    Freeform(Arc<dyn Binding>),
    Builtin(Builtin),
}

pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) enabled: bool,
    description: String,
    params: Vec<String>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

/// Outcome of a successful match.
pub(crate) enum Dispatch {
    /// A menu matched with no further tokens: make it current.
    Navigate(NodeId),
    /// A command matched and its arguments converted.
    Invoke(Invocation),
    /// A session built-in matched.
    Builtin(Builtin),
}

/// A command or menu that has not been inserted into a tree yet.
///
/// ```
/// use std::io::Write;
/// use trellis_shell::{Command, CommandTree, Output};
///
/// let mut tree = CommandTree::new("cli");
/// let net = tree.insert(tree.root(), Command::menu("net").help("Network commands"));
/// tree.insert(
///     net,
///     Command::new("ping", |out: &mut Output, host: String, count: u32| {
///         writeln!(out, "pinging {host} x{count}")
///     })
///     .help("Ping a host")
///     .params(["host", "count"]),
/// );
/// ```
pub struct Command {
    name: String,
    description: String,
    params: Vec<String>,
    kind: NodeKind,
}

impl Command {
    /// A fixed-arity command whose arguments are converted to the handler's
    /// parameter types.
    pub fn new<Args, H>(name: impl Into<String>, handler: H) -> Self
    where
        Args: 'static,
        H: Handler<Args>,
    {
        Self::with_kind(name, NodeKind::Leaf(binding::typed(handler)))
    }

    /// A command receiving every trailing token as a string.
    pub fn freeform<F, R>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Output, Vec<String>) -> R + Send + Sync + 'static,
        R: IntoCommandResult + 'static,
    {
        Self::with_kind(name, NodeKind::Freeform(binding::freeform(handler)))
    }

    /// An empty menu.
    pub fn menu(name: impl Into<String>) -> Self {
        let mut menu = Self::with_kind(
            name,
            NodeKind::Menu {
                children: Vec::new(),
            },
        );
        menu.description = DEFAULT_MENU_DESCRIPTION.to_string();
        menu
    }

    pub(crate) fn builtin(name: &str, builtin: Builtin) -> Self {
        Self::with_kind(name, NodeKind::Builtin(builtin))
    }

    /// Set the description shown by `help`.
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }

    /// Set parameter descriptors shown by `help` instead of type names.
    pub fn params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    fn with_kind(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            params: Vec::new(),
            kind,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Arena holding a root menu and everything registered beneath it.
pub struct CommandTree {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: NodeId,
}

impl CommandTree {
    /// Create a tree whose root menu is called `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut tree = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: NodeId::DANGLING,
        };
        tree.root = tree.alloc(Node {
            name: root_name.into(),
            enabled: true,
            description: DEFAULT_MENU_DESCRIPTION.to_string(),
            params: Vec::new(),
            parent: None,
            kind: NodeKind::Menu {
                children: Vec::new(),
            },
        });
        tree
    }

    /// The root menu.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Append `command` to the children of menu `parent`.
    ///
    /// Returns [`NodeId::DANGLING`] if `parent` is gone or is not a menu, or
    /// if the command name is empty.
    pub fn insert(&mut self, parent: NodeId, command: Command) -> NodeId {
        if !matches!(
            self.get(parent).map(|n| &n.kind),
            Some(NodeKind::Menu { .. })
        ) {
            log::warn!(
                "cannot insert '{}': parent {parent:?} is not a live menu",
                command.name
            );
            return NodeId::DANGLING;
        }
        if command.name.is_empty() {
            log::warn!("cannot insert a command with an empty name under {parent:?}");
            return NodeId::DANGLING;
        }

        log::debug!("registering '{}'", command.name);
        let id = self.alloc(Node {
            name: command.name,
            enabled: true,
            description: command.description,
            params: command.params,
            parent: Some(parent),
            kind: command.kind,
        });
        if let Some(NodeKind::Menu { children }) = self.get_mut(parent).map(|n| &mut n.kind) {
            children.push(id);
        }
        id
    }

    /// Erase `node` from the children of `container`, by identity.
    ///
    /// Returns `false` (and changes nothing) if either id is stale, `node` is
    /// not a child of `container`, or `node` is the root.
    pub fn remove(&mut self, node: NodeId, container: NodeId) -> bool {
        if node == self.root || !self.contains(node) {
            return false;
        }
        let Some(NodeKind::Menu { children }) = self.get_mut(container).map(|n| &mut n.kind)
        else {
            return false;
        };
        let Some(pos) = children.iter().position(|&c| c == node) else {
            return false;
        };
        children.remove(pos);
        self.free_subtree(node);
        true
    }

    /// Enable or disable a node. Returns `false` if the id is stale.
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> bool {
        match self.get_mut(id) {
            Some(node) => {
                node.enabled = enabled;
                true
            },
            None => false,
        }
    }

    /// Whether `id` refers to a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Whether a live node is enabled.
    pub fn is_enabled(&self, id: NodeId) -> Option<bool> {
        self.get(id).map(|n| n.enabled)
    }

    /// Name of a live node.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.get(id).map(|n| n.name.as_str())
    }

    /// Parent menu of a live node (`None` for the root).
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children of a menu, in insertion order. Empty for anything else.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match self.get(id).map(|n| &n.kind) {
            Some(NodeKind::Menu { children }) => children.as_slice(),
            _ => &[],
        }
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.node.is_some()).count()
    }

    /// Always `false`: a tree has at least its root.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = u32::try_from(self.slots.len()).unwrap_or(u32::MAX);
        self.slots.push(Slot {
            generation: 0,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    fn free_subtree(&mut self, id: NodeId) {
        let Some(slot) = self.slots.get_mut(id.index as usize) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        let Some(node) = slot.node.take() else {
            return;
        };
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        log::debug!("removed '{}'", node.name);
        if let NodeKind::Menu { children } = node.kind {
            for child in children {
                self.free_subtree(child);
            }
        }
    }

    // -- Dispatch --

    /// Match `tokens` against node `id`.
    ///
    /// The first token must equal the node's name. A menu with no further
    /// tokens navigates; otherwise the rest is offered to each child in
    /// insertion order and the first match wins. Disabled nodes never match.
    pub(crate) fn exec(&self, id: NodeId, tokens: &[String]) -> Option<Dispatch> {
        let node = self.get(id)?;
        if !node.enabled {
            return None;
        }
        let (first, rest) = tokens.split_first()?;
        if *first != node.name {
            return None;
        }
        match &node.kind {
            NodeKind::Menu { children } => {
                if rest.is_empty() {
                    return Some(Dispatch::Navigate(id));
                }
                children.iter().find_map(|&child| self.exec(child, rest))
            },
            NodeKind::Leaf(binding) | NodeKind::Freeform(binding) => {
                binding.bind(rest).map(Dispatch::Invoke)
            },
            NodeKind::Builtin(builtin) => rest.is_empty().then_some(Dispatch::Builtin(*builtin)),
        }
    }

    /// Match `tokens` against the children of `menu`, then fall back upward.
    ///
    /// On a miss the line is retried against the parent menu itself (so its
    /// name navigates back up) and then against the parent's children,
    /// recursively to the root. A disabled menu matches nothing and stops
    /// the climb.
    pub(crate) fn scan(&self, menu: NodeId, tokens: &[String]) -> Option<Dispatch> {
        let node = self.get(menu)?;
        if !node.enabled {
            return None;
        }
        let NodeKind::Menu { children } = &node.kind else {
            return None;
        };
        children
            .iter()
            .find_map(|&child| self.exec(child, tokens))
            .or_else(|| {
                let parent = node.parent?;
                self.exec(parent, tokens)
                    .or_else(|| self.scan(parent, tokens))
            })
    }

    // -- Help --

    /// Write the help block of one node. Disabled nodes write nothing.
    pub(crate) fn write_help(&self, id: NodeId, out: &mut dyn Write) -> io::Result<()> {
        let Some(node) = self.get(id) else {
            return Ok(());
        };
        if !node.enabled {
            return Ok(());
        }
        write!(out, " - {}", node.name)?;
        match &node.kind {
            NodeKind::Leaf(binding) | NodeKind::Freeform(binding) if node.params.is_empty() => {
                for name in binding.type_names() {
                    write!(out, " {name}")?;
                }
            },
            NodeKind::Menu { .. } => {},
            _ => {
                for param in &node.params {
                    write!(out, " <{param}>")?;
                }
            },
        }
        write!(out, "\n\t{}\n", node.description)
    }

    /// Write help for every command of `menu`, then of each ancestor up to
    /// the root.
    pub(crate) fn write_menu_help(&self, menu: NodeId, out: &mut dyn Write) -> io::Result<()> {
        let mut next = Some(menu);
        while let Some(id) = next {
            let Some(node) = self.get(id) else {
                break;
            };
            if !node.enabled {
                break;
            }
            for &child in self.children(id) {
                self.write_help(child, out)?;
            }
            next = node.parent;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn tokens(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn noop() -> Command {
        Command::new("noop", |_: &mut Output| {})
    }

    /// Run whatever `line` dispatches to from `menu`, returning its output.
    fn run(tree: &CommandTree, menu: NodeId, line: &str) -> Option<String> {
        match tree.scan(menu, &tokens(line))? {
            Dispatch::Invoke(invocation) => {
                let (mut out, capture) = Output::capture();
                invocation(&mut out).unwrap();
                Some(capture.contents())
            },
            Dispatch::Navigate(id) => Some(format!("-> {}", tree.name(id).unwrap())),
            Dispatch::Builtin(b) => Some(format!("builtin {b:?}")),
        }
    }

    fn echo(name: &str, text: &'static str) -> Command {
        Command::new(name, move |out: &mut Output| {
            write!(out, "{text}").unwrap();
        })
    }

    #[test]
    fn new_tree_has_only_root() {
        let tree = CommandTree::new("cli");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.name(tree.root()), Some("cli"));
        assert!(tree.parent(tree.root()).is_none());
        assert!(tree.children(tree.root()).is_empty());
    }

    #[test]
    fn insert_preserves_order_and_parent() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let a = tree.insert(root, echo("a", "A"));
        let b = tree.insert(root, echo("b", "B"));
        assert_eq!(tree.children(root), &[a, b]);
        assert_eq!(tree.parent(a), Some(root));
    }

    #[test]
    fn insert_under_leaf_is_rejected() {
        let mut tree = CommandTree::new("cli");
        let leaf = tree.insert(tree.root(), noop());
        let id = tree.insert(leaf, noop());
        assert_eq!(id, NodeId::DANGLING);
        assert!(!tree.contains(id));
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut tree = CommandTree::new("cli");
        let id = tree.insert(tree.root(), echo("", "reached"));
        assert_eq!(id, NodeId::DANGLING);
        assert!(tree.children(tree.root()).is_empty());
        assert!(tree.scan(tree.root(), &[String::new()]).is_none());
    }

    #[test]
    fn leaf_dispatch() {
        let mut tree = CommandTree::new("cli");
        tree.insert(tree.root(), echo("hello", "hi"));
        assert_eq!(run(&tree, tree.root(), "hello").as_deref(), Some("hi"));
        assert!(run(&tree, tree.root(), "hello extra").is_none());
        assert!(run(&tree, tree.root(), "Hello").is_none());
    }

    #[test]
    fn typed_arguments_reach_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut tree = CommandTree::new("cli");
        tree.insert(
            tree.root(),
            Command::new("add", move |_: &mut Output, a: i32, b: i32| {
                sink.lock().unwrap().push(a + b);
            }),
        );
        assert!(run(&tree, tree.root(), "add 2 40").is_some());
        assert!(run(&tree, tree.root(), "add 2 forty").is_none());
        assert_eq!(*seen.lock().unwrap(), vec![42]);
    }

    #[test]
    fn same_name_different_arity_falls_through() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        tree.insert(
            root,
            Command::new("show", |out: &mut Output, n: u32| {
                write!(out, "one {n}").unwrap();
            }),
        );
        tree.insert(
            root,
            Command::new("show", |out: &mut Output, a: String, b: String| {
                write!(out, "two {a} {b}").unwrap();
            }),
        );
        assert_eq!(run(&tree, root, "show 7").as_deref(), Some("one 7"));
        assert_eq!(run(&tree, root, "show x y").as_deref(), Some("two x y"));
        assert!(run(&tree, root, "show x").is_none());
    }

    #[test]
    fn first_match_wins() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        tree.insert(root, echo("dup", "first"));
        tree.insert(root, echo("dup", "second"));
        assert_eq!(run(&tree, root, "dup").as_deref(), Some("first"));
    }

    #[test]
    fn menu_name_alone_navigates() {
        let mut tree = CommandTree::new("cli");
        let net = tree.insert(tree.root(), Command::menu("net"));
        match tree.scan(tree.root(), &tokens("net")) {
            Some(Dispatch::Navigate(id)) => assert_eq!(id, net),
            _ => panic!("expected navigation"),
        }
    }

    #[test]
    fn full_path_reaches_nested_command() {
        let mut tree = CommandTree::new("cli");
        let net = tree.insert(tree.root(), Command::menu("net"));
        let wifi = tree.insert(net, Command::menu("wifi"));
        tree.insert(wifi, echo("scan", "scanning"));
        assert_eq!(
            run(&tree, tree.root(), "net wifi scan").as_deref(),
            Some("scanning")
        );
    }

    #[test]
    fn upward_fallback_reaches_root_commands() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        tree.insert(
            root,
            Command::new("foo", |out: &mut Output, n: i32| {
                write!(out, "foo {n}").unwrap();
            }),
        );
        let a = tree.insert(root, Command::menu("a"));
        let b = tree.insert(a, Command::menu("b"));
        assert_eq!(run(&tree, b, "foo 3").as_deref(), Some("foo 3"));
    }

    #[test]
    fn ancestor_name_navigates_up() {
        let mut tree = CommandTree::new("cli");
        let a = tree.insert(tree.root(), Command::menu("a"));
        let b = tree.insert(a, Command::menu("b"));
        assert_eq!(run(&tree, b, "cli").as_deref(), Some("-> cli"));
        assert_eq!(run(&tree, b, "a").as_deref(), Some("-> a"));
    }

    #[test]
    fn nearer_command_shadows_ancestor() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        tree.insert(root, echo("status", "root"));
        let sub = tree.insert(root, Command::menu("sub"));
        tree.insert(sub, echo("status", "sub"));
        assert_eq!(run(&tree, sub, "status").as_deref(), Some("sub"));
        assert_eq!(run(&tree, root, "status").as_deref(), Some("root"));
    }

    #[test]
    fn disabled_menu_blocks_children() {
        let mut tree = CommandTree::new("cli");
        let net = tree.insert(tree.root(), Command::menu("net"));
        tree.insert(net, echo("show", "shown"));
        tree.set_enabled(net, false);
        assert!(run(&tree, tree.root(), "net show").is_none());
        assert!(run(&tree, tree.root(), "net").is_none());
        // Scanning from inside a disabled menu matches nothing either.
        assert!(run(&tree, net, "show").is_none());
        tree.set_enabled(net, true);
        assert_eq!(run(&tree, tree.root(), "net show").as_deref(), Some("shown"));
    }

    #[test]
    fn remove_by_identity() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let first = tree.insert(root, echo("dup", "first"));
        tree.insert(root, echo("dup", "second"));
        assert!(tree.remove(first, root));
        assert_eq!(run(&tree, root, "dup").as_deref(), Some("second"));
        assert!(!tree.remove(first, root));
    }

    #[test]
    fn remove_menu_frees_subtree() {
        let mut tree = CommandTree::new("cli");
        let net = tree.insert(tree.root(), Command::menu("net"));
        let show = tree.insert(net, noop());
        assert_eq!(tree.len(), 3);
        assert!(tree.remove(net, tree.root()));
        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(show));
    }

    #[test]
    fn remove_requires_matching_container() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let net = tree.insert(root, Command::menu("net"));
        let cmd = tree.insert(root, noop());
        assert!(!tree.remove(cmd, net));
        assert!(!tree.remove(root, root));
        assert!(tree.contains(cmd));
    }

    #[test]
    fn reused_slot_does_not_revive_old_id() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let old = tree.insert(root, noop());
        tree.remove(old, root);
        let new = tree.insert(root, noop());
        assert!(!tree.contains(old));
        assert!(tree.contains(new));
        assert!(!tree.set_enabled(old, false));
        assert_eq!(tree.is_enabled(new), Some(true));
    }

    #[test]
    fn help_prints_type_names() {
        let mut tree = CommandTree::new("cli");
        let id = tree.insert(
            tree.root(),
            Command::new("ping", |_: &mut Output, _h: String, _n: u32| {}).help("Ping a host"),
        );
        let mut buf = Vec::new();
        tree.write_help(id, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            " - ping <string> <u32>\n\tPing a host\n"
        );
    }

    #[test]
    fn help_prefers_descriptors() {
        let mut tree = CommandTree::new("cli");
        let id = tree.insert(
            tree.root(),
            Command::new("ping", |_: &mut Output, _h: String, _n: u32| {})
                .help("Ping a host")
                .params(["host", "count"]),
        );
        let mut buf = Vec::new();
        tree.write_help(id, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            " - ping <host> <count>\n\tPing a host\n"
        );
    }

    #[test]
    fn help_for_freeform_and_menu() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let say = tree.insert(
            root,
            Command::freeform("echo", |_: &mut Output, _args: Vec<String>| {}).help("Echo"),
        );
        let net = tree.insert(root, Command::menu("net"));
        let mut buf = Vec::new();
        tree.write_help(say, &mut buf).unwrap();
        tree.write_help(net, &mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            " - echo <list of strings>\n\tEcho\n - net\n\t(menu)\n"
        );
    }

    #[test]
    fn menu_help_walks_ancestors_and_skips_disabled() {
        let mut tree = CommandTree::new("cli");
        let root = tree.root();
        let hidden = tree.insert(root, echo("hidden", "").help("h"));
        tree.insert(root, echo("top", "").help("t"));
        let sub = tree.insert(root, Command::menu("sub"));
        tree.insert(sub, echo("inner", "").help("i"));
        tree.set_enabled(hidden, false);

        let mut buf = Vec::new();
        tree.write_menu_help(sub, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, " - inner\n\ti\n - top\n\tt\n - sub\n\t(menu)\n");
    }
}
