//! Tree node representation.
//!
//! Nodes live in the arena and reference each other through `NodeId`
//! handles: one parent link plus an ordered child list, and for directory
//! nodes the two compaction links (compacted child, wrapper). Kind-specific
//! identity lives in the `NodeKind` tag.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thin_vec::ThinVec;

use crate::arena::{NodeId, OptionNodeId};

/// Opaque module identity supplied by the host's module resolver.
///
/// The string doubles as the module node's display name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Box<str>);

impl ModuleId {
    pub fn new(id: impl Into<Box<str>>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Compaction state carried by directory nodes.
///
/// `compacted` points at the next deeper directory folded into this node;
/// `wrapper` points at the directory this node is folded into. The two are
/// maintained in pairs by `FileTree::set_compacted`.
#[derive(Debug)]
pub struct DirInfo {
    pub path: PathBuf,
    pub compacted: OptionNodeId,
    pub wrapper: OptionNodeId,
}

/// Node kind tag with kind-specific identity.
#[derive(Debug)]
pub enum NodeKind {
    Root,
    /// Module group; `key` is the full joined group path used as the cache
    /// key, while the node's name is the last segment.
    Group { key: Box<str> },
    Module { id: ModuleId },
    Directory(DirInfo),
    File { path: PathBuf, marked: bool },
}

/// A single tree node.
pub struct Node {
    pub name: Box<str>,
    pub parent: OptionNodeId,
    pub children: ThinVec<NodeId>,
    /// Leaves folded into this node when file nodes are not materialized.
    pub leaf_count: u32,
    pub kind: NodeKind,
}

fn display_component(path: &Path) -> Box<str> {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into(),
        // Filesystem roots have no file name component.
        None => path.to_string_lossy().into(),
    }
}

impl Node {
    fn new(name: Box<str>, kind: NodeKind) -> Self {
        Self {
            name,
            parent: OptionNodeId::none(),
            children: ThinVec::new(),
            leaf_count: 0,
            kind,
        }
    }

    pub fn root() -> Self {
        Self::new("".into(), NodeKind::Root)
    }

    pub fn group(key: impl Into<Box<str>>, name: impl Into<Box<str>>) -> Self {
        Self::new(name.into(), NodeKind::Group { key: key.into() })
    }

    pub fn module(id: ModuleId) -> Self {
        Self::new(id.as_str().into(), NodeKind::Module { id })
    }

    pub fn directory(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = display_component(&path);
        Self::new(
            name,
            NodeKind::Directory(DirInfo {
                path,
                compacted: OptionNodeId::none(),
                wrapper: OptionNodeId::none(),
            }),
        )
    }

    pub fn file(path: impl Into<PathBuf>, marked: bool) -> Self {
        let path = path.into();
        let name = display_component(&path);
        Self::new(name, NodeKind::File { path, marked })
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        matches!(self.kind, NodeKind::Root)
    }

    #[inline]
    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory(_))
    }

    #[inline]
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// Directory or file path; other kinds have no path identity.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            NodeKind::Directory(info) => Some(&info.path),
            NodeKind::File { path, .. } => Some(path),
            _ => None,
        }
    }

    pub fn dir_info(&self) -> Option<&DirInfo> {
        match &self.kind {
            NodeKind::Directory(info) => Some(info),
            _ => None,
        }
    }

    pub fn dir_info_mut(&mut self) -> Option<&mut DirInfo> {
        match &mut self.kind {
            NodeKind::Directory(info) => Some(info),
            _ => None,
        }
    }

    /// Marked flag for file nodes; false for everything else.
    pub fn is_marked(&self) -> bool {
        matches!(self.kind, NodeKind::File { marked: true, .. })
    }

    /// Sort rank among siblings. Groups precede modules precede
    /// directories; files either follow directories or share their rank.
    pub fn sort_rank(&self, directories_first: bool) -> u8 {
        match self.kind {
            NodeKind::Root => 0,
            NodeKind::Group { .. } => 0,
            NodeKind::Module { .. } => 1,
            NodeKind::Directory(_) => 2,
            NodeKind::File { .. } => {
                if directories_first {
                    3
                } else {
                    2
                }
            }
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("children", &self.children.len())
            .field("leaf_count", &self.leaf_count)
            .field("kind", &self.kind)
            .finish()
    }
}
