//! Command namespace prefixes

use crate::tree::{CommandTree, NodeId};

/// Namespace prefixes for `node`, shallowest first.
///
/// The root command is never part of a prefix, so it gets none. For
/// `root → noun → verb` the prefixes of `verb` are `["noun", "noun.verb"]`.
pub fn prefixes(tree: &CommandTree, node: NodeId) -> Vec<String> {
    let mut prefixes: Vec<String> = Vec::new();
    for name in tree.path(node) {
        let name = name.to_lowercase();
        let next = match prefixes.last() {
            Some(parent) => format!("{}.{}", parent, name),
            None => name,
        };
        prefixes.push(next);
    }
    prefixes
}
