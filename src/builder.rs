//! Tree construction and mutation.
//!
//! `TreeBuilder` owns the tree and its identity caches, carries the view
//! settings, and borrows the host's module resolver. Everything else in the
//! crate funnels through the chain resolution here: batch insertion via the
//! scan driver, the incremental insert/remove operations, and module/group
//! placement.

use std::path::Path;

use crate::arena::NodeId;
use crate::cache::NodeCaches;
use crate::compact;
use crate::node::{ModuleId, Node, NodeKind};
use crate::settings::ViewSettings;
use crate::source::ModuleResolver;
use crate::tree::FileTree;

pub struct TreeBuilder<'a> {
    tree: FileTree,
    caches: NodeCaches,
    settings: ViewSettings,
    modules: &'a dyn ModuleResolver,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(settings: ViewSettings, modules: &'a dyn ModuleResolver) -> Self {
        Self {
            tree: FileTree::new(settings.directories_first),
            caches: NodeCaches::new(),
            settings,
            modules,
        }
    }

    #[inline]
    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    #[inline]
    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub(crate) fn set_show_files(&mut self, show_files: bool) {
        self.settings.show_files = show_files;
    }

    pub fn ensure_sorted(&mut self) {
        self.tree.ensure_sorted();
    }

    /// Finishes building and hands the sorted tree over.
    pub fn into_tree(mut self) -> FileTree {
        self.tree.ensure_sorted();
        self.tree
    }

    // -----------------------------------------------------------------------
    // Leaf insertion
    // -----------------------------------------------------------------------

    /// Directory node for `path`'s parent, resolving (and materializing)
    /// the whole chain. None for a degenerate path with no parent.
    pub fn file_parent_node(&mut self, path: &Path) -> Option<NodeId> {
        let Some(parent) = parent_dir(path) else {
            log::debug!("skipping {}: no parent directory", path.display());
            return None;
        };
        let module = self.modules.module_for_path(path);
        Some(self.resolve_directory(parent, module.as_ref(), None))
    }

    /// Inserts one leaf, returning its attachment node (the subtree a
    /// renderer needs to refresh). None for a degenerate path.
    pub fn insert_leaf(&mut self, path: &Path, marked: bool) -> Option<NodeId> {
        let dir = self.file_parent_node(path)?;
        Some(self.insert_leaf_at(dir, path, marked))
    }

    /// Leaf insertion with the parent already resolved; used by the scan
    /// driver when consecutive leaves share a parent.
    pub fn insert_leaf_at(&mut self, dir: NodeId, path: &Path, marked: bool) -> NodeId {
        if self.settings.show_files {
            let file = self.tree.alloc(Node::file(path, marked));
            self.tree.attach_child(dir, file);
        } else {
            self.tree.bump_leaf_count(dir);
        }
        dir
    }

    /// Incremental insert of one marked path after a build.
    ///
    /// Returns the deepest ancestor directory node that existed before this
    /// call (the minimal subtree to refresh), or None when nothing
    /// pre-existed. Unmarked paths are not inserted incrementally.
    pub fn add_file(&mut self, path: &Path, marked: bool) -> Option<NodeId> {
        if !marked {
            return None;
        }
        let parent = parent_dir(path)?;

        let mut refresh_root = self.lookup_live_dir(parent);
        if refresh_root.is_none() && self.settings.flatten_packages {
            let module = self.modules.module_for_path(path);
            let existed = module
                .as_ref()
                .and_then(|m| self.caches.module(m))
                .is_some_and(|id| self.tree.get(id).is_some());
            let node = self.resolve_module(module.as_ref());
            refresh_root = existed.then_some(node);
        } else {
            let mut ancestor = parent.parent();
            while refresh_root.is_none() {
                let Some(dir) = ancestor.filter(|d| !d.as_os_str().is_empty()) else {
                    break;
                };
                refresh_root = self.lookup_live_dir(dir);
                ancestor = dir.parent();
            }
        }

        let dir = self.file_parent_node(path)?;
        self.insert_leaf_at(dir, path, marked);
        refresh_root
    }

    // -----------------------------------------------------------------------
    // Leaf removal
    // -----------------------------------------------------------------------

    /// Removes every node representing `path` from its parent directory,
    /// prunes emptied ancestors (clearing their cache entries), and
    /// re-folds where a single directory child remains.
    ///
    /// Returns the nearest surviving ancestor, or None when pruning emptied
    /// the tree down to the root.
    ///
    /// # Panics
    /// Panics if `path` was never inserted; removal of unknown paths is a
    /// caller bug.
    pub fn remove_leaf(&mut self, path: &Path) -> Option<NodeId> {
        let Some(parent_path) = parent_dir(path) else {
            panic!("remove_leaf: {} has no parent directory", path.display());
        };
        let Some(dir) = self.lookup_removal_dir(parent_path) else {
            panic!("remove_leaf: {} was never inserted", path.display());
        };

        if self.settings.show_files {
            let matches = self.tree.find_file_children(dir, path);
            assert!(
                !matches.is_empty(),
                "remove_leaf: {} was never inserted",
                path.display()
            );
            for file in matches {
                self.tree.detach(file);
                self.tree.release_subtree(file);
            }
        } else {
            let node = self.tree.node_mut(dir);
            assert!(
                node.leaf_count > 0,
                "remove_leaf: {} was never inserted",
                path.display()
            );
            node.leaf_count -= 1;
        }

        self.prune_and_refold(dir)
    }

    /// Directory flavor of removal: detaches the node (and subtree) for
    /// `path`, then prunes and re-folds like `remove_leaf`. Under
    /// flattening the node hangs off its module node and is detached from
    /// there.
    pub fn remove_directory(&mut self, path: &Path) -> Option<NodeId> {
        if self.settings.flatten_packages {
            let module = self.modules.module_for_path(path);
            let module_node = self.resolve_module(module.as_ref());
            if let Some(dir) = self.lookup_live_dir(path) {
                self.clear_subtree_caches(dir);
                self.tree.detach(dir);
                self.tree.release_subtree(dir);
            }
            return Some(module_node);
        }

        let Some(parent_path) = parent_dir(path) else {
            panic!("remove_directory: {} has no parent directory", path.display());
        };
        let Some(parent) = self.lookup_removal_dir(parent_path) else {
            panic!("remove_directory: {} was never inserted", path.display());
        };
        let matches: Vec<NodeId> = self
            .tree
            .children(parent)
            .iter()
            .copied()
            .filter(|&c| {
                self.tree
                    .node(c)
                    .dir_info()
                    .is_some_and(|info| info.path == path)
            })
            .collect();
        assert!(
            !matches.is_empty(),
            "remove_directory: {} was never inserted",
            path.display()
        );
        for dir in matches {
            self.clear_subtree_caches(dir);
            self.tree.detach(dir);
            self.tree.release_subtree(dir);
        }
        self.prune_and_refold(parent)
    }

    // -----------------------------------------------------------------------
    // Chain resolution
    // -----------------------------------------------------------------------

    /// Resolves the visible node responsible for `dir`, materializing and
    /// caching the directory chain up to its module as needed. Idempotent:
    /// re-resolving an existing path returns the same visible node without
    /// structural change.
    pub fn resolve_directory_chain(&mut self, dir: &Path, module: Option<&ModuleId>) -> NodeId {
        self.resolve_directory(dir, module, None)
    }

    fn resolve_directory(
        &mut self,
        dir: &Path,
        module: Option<&ModuleId>,
        pending_child: Option<NodeId>,
    ) -> NodeId {
        if let Some(hit) = self.lookup_live_dir(dir) {
            if self.settings.compact_empty_middle_packages {
                if let Some(nested) = self.tree.compacted(hit) {
                    return compact::split_fold(&mut self.tree, hit, nested);
                }
                if self.tree.parent(hit).is_some() {
                    return hit;
                }
                if let Some(wrapper) = self.tree.wrapper(hit) {
                    return self.tree.outermost_wrapper(wrapper);
                }
            } else if self.tree.parent(hit).is_some() {
                return hit;
            }
            // Detached and unwrapped: the entry no longer reflects the
            // tree. Drop it and re-derive.
            log::debug!(
                "directory cache entry for {} is stale, rebuilding",
                dir.display()
            );
            self.clear_subtree_caches(hit);
            self.caches.clear_dir(dir);
            self.tree.release_subtree(hit);
        }
        self.create_directory(dir, module, pending_child)
    }

    fn create_directory(
        &mut self,
        dir: &Path,
        module: Option<&ModuleId>,
        pending_child: Option<NodeId>,
    ) -> NodeId {
        let source_root = self.modules.source_root_for_path(dir);
        let content_root = self.modules.content_root_for_path(dir);
        let is_source_root = source_root.as_deref() == Some(dir);
        let is_content_root = content_root.as_deref() == Some(dir);

        let node = self.tree.alloc(Node::directory(dir));
        self.caches.store_dir(dir, node);

        match parent_dir(dir) {
            Some(parent_path) if !self.settings.flatten_packages => {
                if self.settings.compact_empty_middle_packages
                    && !is_source_root
                    && !is_content_root
                {
                    self.tree.set_compacted(node, pending_child);
                }
                if self.modules.module_for_path(parent_path).as_ref() == module {
                    let parent_cached = self.caches.dir(parent_path).is_some();
                    let parent_is_root = source_root.as_deref() == Some(parent_path)
                        || content_root.as_deref() == Some(parent_path);
                    if parent_cached
                        || !self.settings.compact_empty_middle_packages
                        || parent_is_root
                    {
                        let parent = self.resolve_directory(parent_path, module, Some(node));
                        self.tree.attach_child(parent, node);
                        node
                    } else {
                        // Fold: the new node stays detached and resolution
                        // continues to the top of the chain, where content
                        // for the whole chain attaches.
                        let top = self.resolve_directory(parent_path, module, Some(node));
                        if self.tree.wrapper(node).is_none() && self.tree.parent(node).is_none() {
                            // The parent declined the fold (it has no parent
                            // of its own, or resolves as a root): attach
                            // here and stay the visible chain top.
                            self.tree.attach_child(top, node);
                            return node;
                        }
                        top
                    }
                } else {
                    // Module boundary: this directory starts a new subtree
                    // under its module node.
                    let module_node = self.resolve_module(module);
                    self.tree.attach_child(module_node, node);
                    node
                }
            }
            _ => {
                if is_content_root {
                    let module_node = self.resolve_module(module);
                    self.tree.attach_child(module_node, node);
                } else {
                    let anchor = if !is_source_root && source_root.is_some() {
                        source_root
                    } else {
                        content_root
                    };
                    match anchor {
                        Some(anchor) => {
                            if let Ok(rel) = dir.strip_prefix(&anchor) {
                                // Flattened directories display their whole
                                // root-relative path.
                                self.tree.node_mut(node).name =
                                    rel.to_string_lossy().into();
                            }
                            let anchor_node = self.resolve_directory(&anchor, module, None);
                            self.tree.attach_child(anchor_node, node);
                        }
                        None => {
                            // No root to anchor to; hang off the module
                            // node so the directory stays reachable.
                            let module_node = self.resolve_module(module);
                            self.tree.attach_child(module_node, node);
                        }
                    }
                }
                node
            }
        }
    }

    /// Lookup-only resolution for removals: never materializes nodes, but
    /// does split a fold so the removal target's children are addressable.
    fn lookup_removal_dir(&mut self, dir: &Path) -> Option<NodeId> {
        let hit = self.lookup_live_dir(dir)?;
        if self.settings.compact_empty_middle_packages {
            if let Some(nested) = self.tree.compacted(hit) {
                return Some(compact::split_fold(&mut self.tree, hit, nested));
            }
            if self.tree.parent(hit).is_none() {
                return self
                    .tree
                    .wrapper(hit)
                    .map(|w| self.tree.outermost_wrapper(w));
            }
        }
        Some(hit)
    }

    /// Cached directory node whose arena slot is still live.
    fn lookup_live_dir(&self, dir: &Path) -> Option<NodeId> {
        let id = self.caches.dir(dir)?;
        self.tree.get(id).map(|_| id)
    }

    // -----------------------------------------------------------------------
    // Modules and groups
    // -----------------------------------------------------------------------

    /// Module node for `module`, or the root when modules are hidden or no
    /// module applies.
    pub fn resolve_module(&mut self, module: Option<&ModuleId>) -> NodeId {
        let root = self.tree.root();
        let Some(module) = module else {
            return root;
        };
        if !self.settings.show_modules {
            return root;
        }
        if let Some(node) = self.caches.module(module) {
            if self.tree.get(node).is_some_and(|n| n.parent.is_some()) {
                return node;
            }
            log::debug!("module cache entry for {module} is stale, rebuilding");
            self.caches.clear_module(module);
        }

        let node = self.tree.alloc(Node::module(module.clone()));
        self.caches.store_module(module.clone(), node);
        match self.modules.group_path_for_module(module) {
            Some(group_path) if self.settings.show_module_groups && !group_path.is_empty() => {
                let group = self.resolve_group_chain(&group_path);
                self.tree.attach_child(group, node);
            }
            _ => {
                self.tree.attach_child(root, node);
            }
        }
        node
    }

    /// Innermost group node for a group chain, outermost segment first.
    ///
    /// The innermost group is cached and created first (attached to the
    /// root), then re-parented under its parent group as the rest of the
    /// chain resolves; resolving an existing chain only re-confirms the
    /// parent links.
    pub fn resolve_group_chain(&mut self, names: &[String]) -> NodeId {
        let root = self.tree.root();
        let Some(name) = names.last() else {
            return root;
        };
        let key = names.join("/");
        let node = match self.caches.group(&key) {
            Some(node) if self.tree.get(node).is_some() => node,
            _ => {
                let node = self.tree.alloc(Node::group(key.as_str(), name.as_str()));
                self.caches.store_group(key.as_str(), node);
                self.tree.attach_child(root, node);
                node
            }
        };
        if names.len() > 1 {
            let parent = self.resolve_group_chain(&names[..names.len() - 1]);
            self.tree.attach_child(parent, node);
        }
        node
    }

    // -----------------------------------------------------------------------
    // Pruning
    // -----------------------------------------------------------------------

    /// Walks upward from `start`, detaching and releasing every node left
    /// with no children and no aggregated leaves, clearing cache entries
    /// (a pruned fold chain loses every entry). The root is never pruned.
    /// Ends with the re-fold check on the survivor.
    fn prune_and_refold(&mut self, start: NodeId) -> Option<NodeId> {
        let root = self.tree.root();
        let mut node = Some(start);
        let mut parent = self.tree.parent(start);
        while let Some(current) = node {
            let info = self.tree.node(current);
            if !info.children.is_empty() || info.leaf_count > 0 {
                break;
            }
            if current == root {
                parent = None;
                node = None;
                break;
            }
            parent = self.tree.parent(current);
            self.clear_cache_for(current);
            self.tree.detach(current);
            self.tree.release_subtree(current);
            node = parent;
        }

        if self.settings.compact_empty_middle_packages {
            if let Some(survivor) = node {
                self.maybe_refold(survivor);
            }
        }
        parent
    }

    fn maybe_refold(&mut self, dir: NodeId) {
        let node = self.tree.node(dir);
        // A directory holding aggregated leaves of its own is not an
        // empty middle.
        if !node.is_directory() || node.leaf_count > 0 {
            return;
        }
        let children = self.tree.children(dir);
        if children.len() != 1 {
            return;
        }
        let child = children[0];
        let Some(child_path) = self.tree.node(child).dir_info().map(|info| info.path.as_path())
        else {
            return;
        };
        // Source and content roots never fold into their parent.
        if self.modules.source_root_for_path(child_path).as_deref() == Some(child_path) {
            return;
        }
        if self.modules.content_root_for_path(child_path).as_deref() == Some(child_path) {
            return;
        }
        compact::refold_single_child(&mut self.tree, dir);
    }

    /// Null-stores the cache entries owned by a node about to be pruned.
    /// Directory nodes clear their whole remaining fold chain.
    fn clear_cache_for(&mut self, node: NodeId) {
        match &self.tree.node(node).kind {
            NodeKind::Directory(_) => {
                for path in compact::chain_paths(&self.tree, node) {
                    self.caches.clear_dir(path);
                }
            }
            NodeKind::Module { id } => {
                let id = id.clone();
                self.caches.clear_module(&id);
            }
            NodeKind::Group { key } => {
                let key = key.clone();
                self.caches.clear_group(&key);
            }
            NodeKind::Root | NodeKind::File { .. } => {}
        }
    }

    /// Clears directory cache entries for every node in a subtree,
    /// following child lists and fold chains.
    fn clear_subtree_caches(&mut self, start: NodeId) {
        let mut paths = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let node = self.tree.node(id);
            if let NodeKind::Directory(info) = &node.kind {
                paths.push(info.path.clone());
                if let Some(tail) = info.compacted.to_option() {
                    stack.push(tail);
                }
            }
            stack.extend(node.children.iter().copied());
        }
        for path in paths {
            self.caches.clear_dir(path);
        }
    }
}

/// Parent directory of a path, rejecting empty parents so relative
/// single-segment paths count as degenerate.
fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ModuleEntry, NoModules, StaticModules};
    use std::path::PathBuf;

    fn single_module() -> StaticModules {
        StaticModules::new().with_module(ModuleEntry {
            module: ModuleId::new("app"),
            content_root: PathBuf::from("/r"),
            source_roots: vec![PathBuf::from("/r")],
            group: None,
        })
    }

    fn grouped_modules() -> StaticModules {
        StaticModules::new()
            .with_module(ModuleEntry {
                module: ModuleId::new("app"),
                content_root: PathBuf::from("/pa"),
                source_roots: vec![PathBuf::from("/pa")],
                group: Some(vec!["backend".to_string(), "svc".to_string()]),
            })
            .with_module(ModuleEntry {
                module: ModuleId::new("lib"),
                content_root: PathBuf::from("/pl"),
                source_roots: vec![PathBuf::from("/pl")],
                group: None,
            })
    }

    fn outline(builder: &mut TreeBuilder<'_>) -> String {
        builder.ensure_sorted();
        builder.tree().dump()
    }

    #[test]
    fn chain_with_content_shows_as_single_node() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/b/F2"), false);

        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a/b\n        F1 *\n        F2\n"
        );
    }

    #[test]
    fn resolving_an_existing_chain_is_idempotent() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);

        let id = ModuleId::new("app");
        let first = builder.resolve_directory_chain(Path::new("/r/a/b"), Some(&id));
        let len = builder.tree().len();
        let before = outline(&mut builder);

        let second = builder.resolve_directory_chain(Path::new("/r/a/b"), Some(&id));
        assert_eq!(first, second);
        assert_eq!(builder.tree().len(), len);
        assert_eq!(outline(&mut builder), before);
    }

    #[test]
    fn inserting_a_sibling_splits_the_fold() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/b/F2"), true);
        builder.insert_leaf(Path::new("/r/a/G"), true);

        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a\n        b\n          F1 *\n          F2 *\n        G *\n"
        );
    }

    #[test]
    fn build_order_does_not_change_shape() {
        let modules = single_module();

        let mut deep_first = TreeBuilder::new(ViewSettings::default(), &modules);
        deep_first.insert_leaf(Path::new("/r/a/b/c/F1"), true);
        deep_first.insert_leaf(Path::new("/r/a/X"), true);

        let mut shallow_first = TreeBuilder::new(ViewSettings::default(), &modules);
        shallow_first.insert_leaf(Path::new("/r/a/X"), true);
        shallow_first.insert_leaf(Path::new("/r/a/b/c/F1"), true);

        let expected = "<root>\n  app\n    r\n      a\n        b/c\n          F1 *\n        X *\n";
        assert_eq!(outline(&mut deep_first), expected);
        assert_eq!(outline(&mut shallow_first), expected);
    }

    #[test]
    fn removing_the_last_leaf_prunes_and_clears_caches() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);

        assert_eq!(builder.remove_leaf(Path::new("/r/a/b/F1")), None);
        assert_eq!(builder.tree().len(), 1);

        // Pruned entries are null-stored, not forgotten.
        assert_eq!(builder.caches.dir_entry(Path::new("/r/a/b")), Some(None));
        assert_eq!(builder.caches.dir_entry(Path::new("/r/a")), Some(None));
        assert_eq!(builder.caches.dir_entry(Path::new("/r")), Some(None));
        assert!(builder.caches.module(&ModuleId::new("app")).is_none());

        // The same path builds back cleanly over the cleared entries.
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a/b\n        F1 *\n"
        );
    }

    #[test]
    fn removing_one_of_two_leaves_keeps_the_fold() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/b/F2"), true);

        let refresh = builder.remove_leaf(Path::new("/r/a/b/F1")).unwrap();
        assert_eq!(builder.tree().display_name(refresh), "r");
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a/b\n        F2 *\n"
        );
    }

    #[test]
    fn removal_refolds_a_single_directory_child() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/G"), true);

        builder.remove_leaf(Path::new("/r/a/G"));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a/b\n        F1 *\n"
        );
    }

    #[test]
    fn refold_skips_source_root_children() {
        let modules = StaticModules::new().with_module(ModuleEntry {
            module: ModuleId::new("app"),
            content_root: PathBuf::from("/r"),
            source_roots: vec![PathBuf::from("/r/s")],
            group: None,
        });
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/s/F1"), true);
        builder.insert_leaf(Path::new("/r/x/F2"), true);

        // Pruning x leaves r with only the source root s, which must stay
        // a separate node rather than fold into "r/s".
        builder.remove_leaf(Path::new("/r/x/F2"));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      s\n        F1 *\n"
        );
    }

    #[test]
    #[should_panic(expected = "was never inserted")]
    fn removing_an_unknown_path_panics() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.remove_leaf(Path::new("/r/a/c/F2"));
    }

    #[test]
    #[should_panic(expected = "was never inserted")]
    fn removing_an_unknown_file_from_a_known_directory_panics() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.remove_leaf(Path::new("/r/a/b/F9"));
    }

    #[test]
    fn hidden_files_aggregate_into_leaf_counts() {
        let modules = single_module();
        let settings = ViewSettings {
            show_files: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/b/F2"), true);
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a/b (2)\n");

        let refresh = builder.remove_leaf(Path::new("/r/a/b/F1")).unwrap();
        assert_eq!(builder.tree().display_name(refresh), "r");
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a/b (1)\n");

        assert_eq!(builder.remove_leaf(Path::new("/r/a/b/F2")), None);
        assert_eq!(builder.tree().len(), 1);
    }

    #[test]
    fn aggregate_counts_follow_a_fold_split() {
        let modules = single_module();
        let settings = ViewSettings {
            show_files: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a/b (1)\n");

        // The sibling splits the fold; the count stays with the deeper
        // directory it belongs to.
        builder.insert_leaf(Path::new("/r/a/G"), true);
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a (1)\n        b (1)\n"
        );

        let refresh = builder.remove_leaf(Path::new("/r/a/b/F1")).unwrap();
        assert_eq!(builder.tree().display_name(refresh), "a");
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a (1)\n");

        assert_eq!(builder.remove_leaf(Path::new("/r/a/G")), None);
        assert_eq!(builder.tree().len(), 1);
    }

    #[test]
    fn aggregate_counts_survive_a_refold() {
        let modules = single_module();
        let settings = ViewSettings {
            show_files: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/c/F2"), true);
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a\n        b (1)\n        c (1)\n"
        );

        // Pruning c re-folds a around b; b's count comes up with it.
        builder.remove_leaf(Path::new("/r/a/c/F2"));
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a/b (1)\n");

        assert_eq!(builder.remove_leaf(Path::new("/r/a/b/F1")), None);
        assert_eq!(builder.tree().len(), 1);
    }

    #[test]
    fn refold_skips_directories_with_own_leaves() {
        let modules = single_module();
        let settings = ViewSettings {
            show_files: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/F1"), true);
        builder.insert_leaf(Path::new("/r/a/b/F2"), true);
        builder.insert_leaf(Path::new("/r/a/c/F3"), true);

        // Pruning c leaves a with a single directory child, but a still
        // holds a leaf of its own and must not fold into "a/b".
        builder.remove_leaf(Path::new("/r/a/c/F3"));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a (1)\n        b (1)\n"
        );

        // Once its own leaf is gone the fold forms.
        builder.remove_leaf(Path::new("/r/a/F1"));
        assert_eq!(outline(&mut builder), "<root>\n  app\n    r\n      a/b (1)\n");
    }

    #[test]
    fn duplicate_file_nodes_are_removed_together() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        let dir = builder.insert_leaf(Path::new("/r/a/F1"), true).unwrap();
        builder.add_file(Path::new("/r/a/F1"), true);
        assert_eq!(
            builder.tree().find_file_children(dir, Path::new("/r/a/F1")).len(),
            2
        );

        builder.remove_leaf(Path::new("/r/a/F1"));
        assert_eq!(builder.tree().len(), 1);
    }

    #[test]
    fn add_file_reports_the_deepest_preexisting_ancestor() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        let a = builder.insert_leaf(Path::new("/r/a/F1"), true).unwrap();

        let refresh = builder.add_file(Path::new("/r/a/b/c/F2"), true);
        assert_eq!(refresh, Some(a));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a\n        b/c\n          F2 *\n        F1 *\n"
        );

        // Unmarked paths are not inserted incrementally.
        let len = builder.tree().len();
        assert_eq!(builder.add_file(Path::new("/r/a/b/c/F3"), false), None);
        assert_eq!(builder.tree().len(), len);
    }

    #[test]
    fn flattened_directories_anchor_under_their_root() {
        let modules = single_module();
        let settings = ViewSettings {
            flatten_packages: true,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/c/F2"), true);
        builder.insert_leaf(Path::new("/r/F3"), true);

        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a/b\n        F1 *\n      c\n        F2 *\n      F3 *\n"
        );
    }

    #[test]
    fn flattened_directory_removal_detaches_from_the_module() {
        let modules = single_module();
        let settings = ViewSettings {
            flatten_packages: true,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/c/F2"), true);

        let refresh = builder.remove_directory(Path::new("/r/a/b")).unwrap();
        assert_eq!(builder.tree().display_name(refresh), "app");
        assert_eq!(builder.caches.dir_entry(Path::new("/r/a/b")), Some(None));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      c\n        F2 *\n"
        );
    }

    #[test]
    fn nested_directory_removal_prunes_from_the_parent() {
        let modules = single_module();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);
        builder.insert_leaf(Path::new("/r/a/G"), true);

        let refresh = builder.remove_directory(Path::new("/r/a/b")).unwrap();
        assert_eq!(builder.tree().display_name(refresh), "r");
        assert_eq!(builder.caches.dir_entry(Path::new("/r/a/b")), Some(None));
        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a\n        G *\n"
        );
    }

    #[test]
    fn modules_nest_under_their_group_chains() {
        let modules = grouped_modules();
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/pa/F1"), true);
        builder.insert_leaf(Path::new("/pl/F2"), true);

        assert_eq!(
            outline(&mut builder),
            "<root>\n  backend\n    svc\n      app\n        pa\n          F1 *\n  lib\n    pl\n      F2 *\n"
        );
    }

    #[test]
    fn same_leaf_group_names_stay_separate() {
        let modules = StaticModules::new()
            .with_module(ModuleEntry {
                module: ModuleId::new("alpha"),
                content_root: PathBuf::from("/alpha"),
                source_roots: vec![PathBuf::from("/alpha")],
                group: Some(vec!["a".to_string(), "x".to_string()]),
            })
            .with_module(ModuleEntry {
                module: ModuleId::new("beta"),
                content_root: PathBuf::from("/beta"),
                source_roots: vec![PathBuf::from("/beta")],
                group: Some(vec!["b".to_string(), "x".to_string()]),
            });
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/alpha/F1"), true);
        builder.insert_leaf(Path::new("/beta/F2"), true);

        // Both chains end in a group named "x"; they must stay two nodes.
        assert_eq!(
            outline(&mut builder),
            "<root>\n  a\n    x\n      alpha\n        alpha\n          F1 *\n  b\n    x\n      beta\n        beta\n          F2 *\n"
        );
    }

    #[test]
    fn hidden_modules_collapse_to_the_root() {
        let modules = single_module();
        let settings = ViewSettings {
            show_modules: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/F1"), true);

        assert_eq!(outline(&mut builder), "<root>\n  r\n    a\n      F1 *\n");
    }

    #[test]
    fn hidden_groups_put_modules_on_the_root() {
        let modules = grouped_modules();
        let settings = ViewSettings {
            show_module_groups: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/pa/F1"), true);

        assert_eq!(outline(&mut builder), "<root>\n  app\n    pa\n      F1 *\n");
    }

    #[test]
    fn rootless_chains_stay_reachable() {
        let modules = NoModules;
        let mut builder = TreeBuilder::new(ViewSettings::default(), &modules);
        builder.insert_leaf(Path::new("/r/a/F1"), true);

        assert_eq!(outline(&mut builder), "<root>\n  /\n    r/a\n      F1 *\n");

        let top = builder.resolve_directory_chain(Path::new("/r/a"), None);
        assert_eq!(builder.tree().display_name(top), "r/a");
    }

    #[test]
    fn disabled_compaction_materializes_every_level() {
        let modules = single_module();
        let settings = ViewSettings {
            compact_empty_middle_packages: false,
            ..ViewSettings::default()
        };
        let mut builder = TreeBuilder::new(settings, &modules);
        builder.insert_leaf(Path::new("/r/a/b/F1"), true);

        assert_eq!(
            outline(&mut builder),
            "<root>\n  app\n    r\n      a\n        b\n          F1 *\n"
        );
    }
}
