//! Prefix completion over the command tree.

use crate::tree::{CommandTree, NodeId, NodeKind};

impl CommandTree {
    /// Candidates offered by node `id` for `line`.
    ///
    /// A command offers its name when the name starts with `line`. A menu
    /// whose name is a prefix of `line` strips it, completes the rest
    /// against its children and prefixes each result with `"name "`;
    /// otherwise it behaves like a command. Disabled nodes offer nothing.
    pub(crate) fn completion_recursive(&self, id: NodeId, line: &str) -> Vec<String> {
        let Some(node) = self.get(id) else {
            return Vec::new();
        };
        if !node.enabled {
            return Vec::new();
        }
        if let NodeKind::Menu { children } = &node.kind {
            if let Some(rest) = line.strip_prefix(node.name.as_str()) {
                let rest = rest.trim_start();
                return children
                    .iter()
                    .flat_map(|&child| self.completion_recursive(child, rest))
                    .map(|candidate| format!("{} {candidate}", node.name))
                    .collect();
            }
        }
        if node.name.starts_with(line) {
            vec![node.name.clone()]
        } else {
            Vec::new()
        }
    }

    /// Candidates for `line` typed while `menu` is current: its children,
    /// then every ancestor and the ancestors' children. Unsorted.
    pub(crate) fn completions(&self, menu: NodeId, line: &str) -> Vec<String> {
        let Some(node) = self.get(menu) else {
            return Vec::new();
        };
        if !node.enabled {
            return Vec::new();
        }
        let mut result: Vec<String> = self
            .children(menu)
            .iter()
            .flat_map(|&child| self.completion_recursive(child, line))
            .collect();
        if let Some(parent) = node.parent {
            result.extend(self.completion_recursive(parent, line));
            result.extend(self.completions(parent, line));
        }
        result
    }
}
