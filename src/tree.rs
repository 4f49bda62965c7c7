//! The tree itself: arena-backed nodes plus structural operations.
//!
//! `FileTree` owns every node and keeps the invariants the builder relies
//! on: parent links and child lists agree, compacted/wrapper references are
//! maintained in pairs, and a single dirty flag drives lazy sorting.

use std::cmp::Ordering;
use std::path::Path;

use thin_vec::ThinVec;

use crate::arena::{Arena, NodeId, OptionNodeId};
use crate::node::{Node, NodeKind};

#[derive(Debug)]
pub struct FileTree {
    arena: Arena<Node>,
    root: NodeId,
    sorted: bool,
    directories_first: bool,
}

impl FileTree {
    pub fn new(directories_first: bool) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(Node::root());
        Self {
            arena,
            root,
            sorted: true,
            directories_first,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, the root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// # Panics
    /// Panics if `id` was released.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.arena[id]
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id].parent.to_option()
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.arena[id].children
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.arena.iter()
    }

    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        self.arena.insert(node)
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Attaches `child` under `parent`, detaching it from any current
    /// parent first. Re-attachment moves the node, matching the mutable
    /// tree-node semantics the group chain resolution depends on.
    pub(crate) fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert_ne!(parent, child, "node cannot parent itself");
        self.detach(child);
        self.arena[child].parent = OptionNodeId::some(parent);
        self.arena[parent].children.push(child);
        self.sorted = false;
    }

    /// Removes `child` from its parent's child list. The node stays
    /// allocated; folded-away directories live in exactly this state.
    pub(crate) fn detach(&mut self, child: NodeId) {
        let Some(parent) = self.arena[child].parent.to_option() else {
            return;
        };
        let children = &mut self.arena[parent].children;
        if let Some(pos) = children.iter().position(|&c| c == child) {
            children.remove(pos);
        }
        self.arena[child].parent = OptionNodeId::none();
        self.sorted = false;
    }

    /// Moves every child of `from` onto `to`, preserving order.
    pub(crate) fn move_children(&mut self, from: NodeId, to: NodeId) {
        debug_assert_ne!(from, to);
        let kids = std::mem::take(&mut self.arena[from].children);
        for &kid in &kids {
            self.arena[kid].parent = OptionNodeId::some(to);
        }
        self.arena[to].children.extend(kids);
        self.sorted = false;
    }

    /// Detaches every child of `id`, returning them parentless but still
    /// allocated.
    pub(crate) fn take_children(&mut self, id: NodeId) -> ThinVec<NodeId> {
        let kids = std::mem::take(&mut self.arena[id].children);
        for &kid in &kids {
            self.arena[kid].parent = OptionNodeId::none();
        }
        self.sorted = false;
        kids
    }

    /// Releases `id` and everything reachable from it: children,
    /// transitively, plus folded chain tails hanging off directory nodes.
    /// Returns the number of freed nodes. Cache entries are the caller's
    /// responsibility and must be cleared before the paths are gone.
    pub(crate) fn release_subtree(&mut self, id: NodeId) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(node) = self.arena.try_remove(next) else {
                continue;
            };
            freed += 1;
            stack.extend(node.children.iter().copied());
            if let NodeKind::Directory(info) = &node.kind {
                if let Some(tail) = info.compacted.to_option() {
                    stack.push(tail);
                }
            }
        }
        freed
    }

    pub(crate) fn bump_leaf_count(&mut self, id: NodeId) {
        self.arena[id].leaf_count += 1;
    }

    /// Moves the aggregated leaf count of `from` onto `to`.
    pub(crate) fn transfer_leaf_count(&mut self, from: NodeId, to: NodeId) {
        let moved = std::mem::take(&mut self.arena[from].leaf_count);
        self.arena[to].leaf_count += moved;
    }

    /// All File children of `parent` for the given path. Several nodes may
    /// represent the same file.
    pub fn find_file_children(&self, parent: NodeId, path: &Path) -> Vec<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .filter(|&c| match &self.arena[c].kind {
                NodeKind::File { path: p, .. } => p == path,
                _ => false,
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Compaction links
    // -----------------------------------------------------------------------

    /// Sets `dir`'s compacted child, maintaining the wrapper back reference
    /// on both the old and the new child.
    pub(crate) fn set_compacted(&mut self, dir: NodeId, child: Option<NodeId>) {
        let old = self.compacted(dir);
        if let Some(old) = old {
            if let Some(info) = self.arena[old].dir_info_mut() {
                info.wrapper = OptionNodeId::none();
            }
        }
        let info = self.arena[dir]
            .dir_info_mut()
            .expect("compacted link on non-directory node");
        info.compacted = OptionNodeId::from_option(child);
        if let Some(child) = child {
            let info = self.arena[child]
                .dir_info_mut()
                .expect("wrapper link on non-directory node");
            info.wrapper = OptionNodeId::some(dir);
        }
    }

    #[inline]
    pub fn compacted(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id]
            .dir_info()
            .and_then(|info| info.compacted.to_option())
    }

    #[inline]
    pub fn wrapper(&self, id: NodeId) -> Option<NodeId> {
        self.arena[id]
            .dir_info()
            .and_then(|info| info.wrapper.to_option())
    }

    /// Follows wrapper references up to the outermost (attached) node of a
    /// fold chain. Returns `start` itself when it has no wrapper.
    pub(crate) fn outermost_wrapper(&self, start: NodeId) -> NodeId {
        let mut node = start;
        while let Some(wrapper) = self.wrapper(node) {
            node = wrapper;
        }
        node
    }

    /// Display name for a node. A directory holding a compacted chain
    /// renders as the joined segments, e.g. `a/b/c`.
    pub fn display_name(&self, id: NodeId) -> String {
        let node = &self.arena[id];
        let mut name = node.name.to_string();
        let mut next = node.dir_info().and_then(|info| info.compacted.to_option());
        while let Some(tail) = next {
            let tail_node = &self.arena[tail];
            name.push('/');
            name.push_str(&tail_node.name);
            next = tail_node
                .dir_info()
                .and_then(|info| info.compacted.to_option());
        }
        name
    }

    // -----------------------------------------------------------------------
    // Ordering
    // -----------------------------------------------------------------------

    #[inline]
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Runs one recursive stable sort pass if any mutation happened since
    /// the last one.
    pub fn ensure_sorted(&mut self) {
        if self.sorted {
            return;
        }
        let directories_first = self.directories_first;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let mut kids: Vec<NodeId> = self.arena[id].children.iter().copied().collect();
            kids.sort_by(|&a, &b| {
                let (na, nb) = (&self.arena[a], &self.arena[b]);
                na.sort_rank(directories_first)
                    .cmp(&nb.sort_rank(directories_first))
                    .then_with(|| cmp_names(&na.name, &nb.name))
            });
            stack.extend(kids.iter().copied());
            self.arena[id].children = kids.into_iter().collect();
        }
        self.sorted = true;
    }

    /// Indented outline of the visible tree, for logs and tests. Marked
    /// files get a `*` suffix, aggregated leaves show as a count.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = &self.arena[id];
        for _ in 0..depth {
            out.push_str("  ");
        }
        if node.is_root() {
            out.push_str("<root>");
        } else {
            out.push_str(&self.display_name(id));
        }
        if node.is_marked() {
            out.push_str(" *");
        }
        if node.leaf_count > 0 {
            out.push_str(&format!(" ({})", node.leaf_count));
        }
        out.push('\n');
        for &child in node.children.iter() {
            self.dump_node(child, depth + 1, out);
        }
    }
}

/// Case-insensitive name order with a case-sensitive tiebreak, making the
/// order total and deterministic.
fn cmp_names(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::ModuleId;

    #[test]
    fn attach_and_detach_keep_links_consistent() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let dir = tree.alloc(Node::directory("/a"));
        let file = tree.alloc(Node::file("/a/f", false));

        tree.attach_child(root, dir);
        tree.attach_child(dir, file);
        assert_eq!(tree.parent(dir), Some(root));
        assert_eq!(tree.children(dir), &[file]);

        tree.detach(file);
        assert_eq!(tree.parent(file), None);
        assert!(tree.children(dir).is_empty());
        // Detaching a parentless node is a no-op.
        tree.detach(file);
    }

    #[test]
    fn attach_reparents() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let a = tree.alloc(Node::directory("/a"));
        let b = tree.alloc(Node::directory("/b"));
        let file = tree.alloc(Node::file("/a/f", false));

        tree.attach_child(root, a);
        tree.attach_child(root, b);
        tree.attach_child(a, file);
        tree.attach_child(b, file);

        assert!(tree.children(a).is_empty());
        assert_eq!(tree.children(b), &[file]);
        assert_eq!(tree.parent(file), Some(b));
    }

    #[test]
    fn move_children_preserves_order() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let from = tree.alloc(Node::directory("/from"));
        let to = tree.alloc(Node::directory("/to"));
        tree.attach_child(root, from);
        tree.attach_child(root, to);
        let f1 = tree.alloc(Node::file("/from/1", false));
        let f2 = tree.alloc(Node::file("/from/2", false));
        tree.attach_child(from, f1);
        tree.attach_child(from, f2);

        tree.move_children(from, to);
        assert!(tree.children(from).is_empty());
        assert_eq!(tree.children(to), &[f1, f2]);
        assert_eq!(tree.parent(f1), Some(to));
    }

    #[test]
    fn compacted_links_are_paired() {
        let mut tree = FileTree::new(true);
        let a = tree.alloc(Node::directory("/a"));
        let b = tree.alloc(Node::directory("/a/b"));
        let c = tree.alloc(Node::directory("/a/b/c"));

        tree.set_compacted(a, Some(b));
        tree.set_compacted(b, Some(c));
        assert_eq!(tree.compacted(a), Some(b));
        assert_eq!(tree.wrapper(b), Some(a));
        assert_eq!(tree.outermost_wrapper(c), a);
        assert_eq!(tree.display_name(a), "a/b/c");

        // Replacing the compacted child clears the old wrapper.
        tree.set_compacted(a, None);
        assert_eq!(tree.compacted(a), None);
        assert_eq!(tree.wrapper(b), None);
        assert_eq!(tree.display_name(a), "a");
    }

    #[test]
    fn release_subtree_frees_folded_tails() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let a = tree.alloc(Node::directory("/a"));
        let b = tree.alloc(Node::directory("/a/b"));
        let file = tree.alloc(Node::file("/a/b/f", true));
        tree.attach_child(root, a);
        tree.attach_child(a, file);
        tree.set_compacted(a, Some(b));

        tree.detach(a);
        let freed = tree.release_subtree(a);
        assert_eq!(freed, 3);
        assert!(tree.get(a).is_none());
        assert!(tree.get(b).is_none());
        assert_eq!(tree.len(), 1); // root remains
    }

    #[test]
    fn ensure_sorted_orders_kinds_then_names() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let file = tree.alloc(Node::file("/m/Beta.rs", false));
        let dir = tree.alloc(Node::directory("/m/zeta"));
        let module = tree.alloc(Node::module(ModuleId::new("app")));
        let dir2 = tree.alloc(Node::directory("/m/Alpha"));

        tree.attach_child(root, file);
        tree.attach_child(root, dir);
        tree.attach_child(root, module);
        tree.attach_child(root, dir2);

        assert!(!tree.is_sorted());
        tree.ensure_sorted();
        assert!(tree.is_sorted());
        assert_eq!(tree.children(root), &[module, dir2, dir, file]);

        // Already sorted: the pass is skipped and order is unchanged.
        tree.ensure_sorted();
        assert_eq!(tree.children(root), &[module, dir2, dir, file]);
    }

    #[test]
    fn files_interleave_when_directories_first_is_off() {
        let mut tree = FileTree::new(false);
        let root = tree.root();
        let dir = tree.alloc(Node::directory("/m/beta"));
        let file = tree.alloc(Node::file("/m/alpha.rs", false));
        tree.attach_child(root, dir);
        tree.attach_child(root, file);

        tree.ensure_sorted();
        assert_eq!(tree.children(root), &[file, dir]);
    }

    #[test]
    fn dump_renders_marks_and_counts() {
        let mut tree = FileTree::new(true);
        let root = tree.root();
        let dir = tree.alloc(Node::directory("/a"));
        let file = tree.alloc(Node::file("/a/f.rs", true));
        tree.attach_child(root, dir);
        tree.attach_child(dir, file);
        tree.bump_leaf_count(dir);

        let dump = tree.dump();
        assert_eq!(dump, "<root>\n  a (1)\n    f.rs *\n");
    }
}
