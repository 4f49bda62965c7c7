//! Single-child directory chain compaction.
//!
//! When enabled, a run of directories with exactly one child each shows as
//! one node (`a/b/c`). The visible node is the top of the chain; each chain
//! node records the next deeper one as its compacted child and is recorded
//! back as that child's wrapper. Content always attaches at the visible top
//! and semantically belongs to the deepest directory of the remaining
//! chain.
//!
//! A directory node moves through four states: unmaterialized (no node
//! yet), materialized standalone (attached, no wrapper), materialized
//! folded (detached, wrapper set), pruned (released, cache entry cleared).
//! Folds form bottom-up during chain resolution, split when a fold member
//! is resolved directly, and re-form when a removal leaves a directory with
//! a single directory child.

use std::path::PathBuf;

use crate::arena::NodeId;
use crate::tree::FileTree;

/// Splits the fold held by `dir`, whose compacted child is `nested`.
///
/// The content of the outermost wrapper (the attached node currently
/// showing the whole chain) moves down onto `nested`, which then becomes a
/// real child of that wrapper. Content is the child nodes plus, with file
/// nodes hidden, the aggregated leaf count. Returns the outermost wrapper;
/// content for `dir` attaches there.
pub(crate) fn split_fold(tree: &mut FileTree, dir: NodeId, nested: NodeId) -> NodeId {
    let top = tree.outermost_wrapper(nested);
    tree.move_children(top, nested);
    tree.transfer_leaf_count(top, nested);
    tree.set_compacted(dir, None);
    tree.attach_child(top, nested);
    top
}

/// Re-establishes a fold after a removal left `dir` with exactly one child
/// that is itself a directory: the child is detached, its content (children
/// and aggregated leaf count) lifts up into `dir`, and it becomes `dir`'s
/// compacted child.
pub(crate) fn refold_single_child(tree: &mut FileTree, dir: NodeId) {
    debug_assert_eq!(tree.children(dir).len(), 1);
    let child = tree.children(dir)[0];
    tree.take_children(dir);
    tree.move_children(child, dir);
    tree.transfer_leaf_count(child, dir);
    tree.set_compacted(dir, Some(child));
}

/// Paths of every directory along `start`'s compacted chain, `start`
/// included. Callers clear the cache entries of a pruned chain with these
/// before releasing the nodes.
pub(crate) fn chain_paths(tree: &FileTree, start: NodeId) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut next = Some(start);
    while let Some(id) = next {
        if let Some(path) = tree.node(id).path() {
            paths.push(path.to_path_buf());
        }
        next = tree.compacted(id);
    }
    paths
}
