//! View settings controlling tree shape.
//!
//! Settings are fixed for the lifetime of a builder. Hosts that let users
//! toggle a flag rebuild the model rather than mutating it in place.

use serde::{Deserialize, Serialize};

/// Flags controlling how the tree is assembled and displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Group files under module nodes.
    pub show_modules: bool,
    /// Nest module nodes under their module-group chain.
    pub show_module_groups: bool,
    /// Attach every directory directly under its source/content root
    /// instead of nesting directories.
    pub flatten_packages: bool,
    /// Collapse single-child directory chains into one visible node.
    pub compact_empty_middle_packages: bool,
    /// Materialize a node per file; when off, files fold into their
    /// parent's aggregate count.
    pub show_files: bool,
    /// Also insert files the marker rejects.
    pub include_unmarked: bool,
    /// Order directories before files among siblings.
    pub directories_first: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            show_modules: true,
            show_module_groups: true,
            flatten_packages: false,
            compact_empty_middle_packages: true,
            show_files: true,
            include_unmarked: true,
            directories_first: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_flags() {
        let s = ViewSettings::default();
        assert!(s.show_modules);
        assert!(s.show_module_groups);
        assert!(!s.flatten_packages);
        assert!(s.compact_empty_middle_packages);
        assert!(s.show_files);
        assert!(s.include_unmarked);
        assert!(s.directories_first);
    }
}
