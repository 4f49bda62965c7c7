//! Incrementally maintained tree model of marked files.
//!
//! Turns a flat enumeration of paths into a display-oriented tree of
//! Root → Group → Module → Directory → File nodes:
//!
//! - Chains of single-child directories collapse into one visible node and
//!   split back apart as content arrives
//! - Identity caches give directories, modules, and groups stable nodes
//!   across incremental inserts and removals
//! - Module and group structure comes from a host-supplied resolver; the
//!   crate never invents it
//! - Batch builds run through a re-drivable path source with counters,
//!   progress reporting, and cooperative cancellation
//!
//! [`TreeBuilder`] holds the mutable state, [`ScanDriver`] performs batch
//! builds, and [`WalkSource`] enumerates a real directory tree.

pub mod arena;
pub mod builder;
mod cache;
mod compact;
pub mod error;
pub mod node;
pub mod scan;
pub mod settings;
pub mod source;
pub mod tree;
pub mod walk;

// Re-export main types
pub use arena::NodeId;
pub use builder::TreeBuilder;
pub use error::{Result, TreeError};
pub use node::{ModuleId, Node, NodeKind};
pub use scan::{build_model, ProgressSnapshot, ScanDriver, ScanProgress, ScanTotals, TreeModel};
pub use settings::ViewSettings;
pub use source::{
    Marker, ModuleEntry, ModuleResolver, NoModules, PathSource, ScanEntry, StaticModules,
};
pub use tree::FileTree;
pub use walk::WalkSource;
