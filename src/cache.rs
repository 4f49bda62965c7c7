//! Identity caches mapping external identities to tree nodes.
//!
//! Three maps: directory path to directory node, module id to module node,
//! group path to group node. Clearing an entry stores an explicit empty
//! value instead of removing the key, so a later walk can tell "never
//! computed" apart from "known pruned". File nodes are intentionally not
//! cached; several file nodes may exist for one path.

use std::path::{Path, PathBuf};

use fnv::FnvHashMap;

use crate::arena::NodeId;
use crate::node::ModuleId;

#[derive(Default)]
pub struct NodeCaches {
    dirs: FnvHashMap<PathBuf, Option<NodeId>>,
    modules: FnvHashMap<ModuleId, Option<NodeId>>,
    groups: FnvHashMap<Box<str>, Option<NodeId>>,
}

impl NodeCaches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached directory node, collapsing cleared entries to None.
    #[inline]
    pub fn dir(&self, path: &Path) -> Option<NodeId> {
        self.dirs.get(path).copied().flatten()
    }

    /// Raw directory entry: None = never computed, Some(None) = cleared.
    #[inline]
    pub fn dir_entry(&self, path: &Path) -> Option<Option<NodeId>> {
        self.dirs.get(path).copied()
    }

    pub fn store_dir(&mut self, path: impl Into<PathBuf>, node: NodeId) {
        self.dirs.insert(path.into(), Some(node));
    }

    pub fn clear_dir(&mut self, path: impl Into<PathBuf>) {
        self.dirs.insert(path.into(), None);
    }

    #[inline]
    pub fn module(&self, id: &ModuleId) -> Option<NodeId> {
        self.modules.get(id).copied().flatten()
    }

    pub fn store_module(&mut self, id: ModuleId, node: NodeId) {
        self.modules.insert(id, Some(node));
    }

    pub fn clear_module(&mut self, id: &ModuleId) {
        self.modules.insert(id.clone(), None);
    }

    #[inline]
    pub fn group(&self, key: &str) -> Option<NodeId> {
        self.groups.get(key).copied().flatten()
    }

    pub fn store_group(&mut self, key: impl Into<Box<str>>, node: NodeId) {
        self.groups.insert(key.into(), Some(node));
    }

    pub fn clear_group(&mut self, key: &str) {
        self.groups.insert(key.into(), None);
    }
}
