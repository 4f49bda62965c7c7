//! External collaborator interfaces: path enumeration, mark predicate,
//! module layout.
//!
//! The core never walks a filesystem or decides module boundaries on its
//! own; hosts supply all three. `walk::WalkSource` is the bundled
//! filesystem-backed enumerator.

use std::path::{Path, PathBuf};

use crate::node::ModuleId;

/// One enumerated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl ScanEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }
}

/// Re-drivable enumeration of paths.
///
/// A build drives the source twice (count pass, then build pass), so
/// iteration is visitor-style rather than a consuming iterator. The visitor
/// returns false to stop the drive early. Enumeration order need not be
/// stable between drives.
pub trait PathSource {
    fn iterate(&mut self, visit: &mut dyn FnMut(&ScanEntry) -> bool);
}

impl PathSource for Vec<ScanEntry> {
    fn iterate(&mut self, visit: &mut dyn FnMut(&ScanEntry) -> bool) {
        for entry in self.iter() {
            if !visit(entry) {
                break;
            }
        }
    }
}

impl PathSource for &[ScanEntry] {
    fn iterate(&mut self, visit: &mut dyn FnMut(&ScanEntry) -> bool) {
        for entry in self.iter() {
            if !visit(entry) {
                break;
            }
        }
    }
}

/// Externally supplied mark predicate.
pub trait Marker {
    fn is_marked(&self, path: &Path) -> bool;
}

impl<F> Marker for F
where
    F: Fn(&Path) -> bool,
{
    fn is_marked(&self, path: &Path) -> bool {
        self(path)
    }
}

/// Module layout supplied by the host.
///
/// Root queries answer for any path inside the root, not just the root
/// itself.
pub trait ModuleResolver {
    /// Module owning `path`, if any.
    fn module_for_path(&self, path: &Path) -> Option<ModuleId>;

    /// Innermost source root containing `path`.
    fn source_root_for_path(&self, path: &Path) -> Option<PathBuf>;

    /// Content root containing `path`.
    fn content_root_for_path(&self, path: &Path) -> Option<PathBuf>;

    /// Group chain for a module, outermost segment first.
    fn group_path_for_module(&self, module: &ModuleId) -> Option<Vec<String>>;
}

/// Resolver for hosts without module structure.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoModules;

impl ModuleResolver for NoModules {
    fn module_for_path(&self, _path: &Path) -> Option<ModuleId> {
        None
    }

    fn source_root_for_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    fn content_root_for_path(&self, _path: &Path) -> Option<PathBuf> {
        None
    }

    fn group_path_for_module(&self, _module: &ModuleId) -> Option<Vec<String>> {
        None
    }
}

/// Table-driven resolver for hosts with a fixed module layout.
#[derive(Debug, Default)]
pub struct StaticModules {
    entries: Vec<ModuleEntry>,
}

/// One module's layout in a [`StaticModules`] table.
#[derive(Debug, Clone)]
pub struct ModuleEntry {
    pub module: ModuleId,
    pub content_root: PathBuf,
    pub source_roots: Vec<PathBuf>,
    pub group: Option<Vec<String>>,
}

impl StaticModules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, entry: ModuleEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// The entry whose content root contains `path`, preferring the most
    /// specific root when entries nest.
    fn entry_for_path(&self, path: &Path) -> Option<&ModuleEntry> {
        self.entries
            .iter()
            .filter(|e| path.starts_with(&e.content_root))
            .max_by_key(|e| e.content_root.components().count())
    }
}

impl ModuleResolver for StaticModules {
    fn module_for_path(&self, path: &Path) -> Option<ModuleId> {
        self.entry_for_path(path).map(|e| e.module.clone())
    }

    fn source_root_for_path(&self, path: &Path) -> Option<PathBuf> {
        let entry = self.entry_for_path(path)?;
        entry
            .source_roots
            .iter()
            .filter(|root| path.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    }

    fn content_root_for_path(&self, path: &Path) -> Option<PathBuf> {
        self.entry_for_path(path).map(|e| e.content_root.clone())
    }

    fn group_path_for_module(&self, module: &ModuleId) -> Option<Vec<String>> {
        self.entries
            .iter()
            .find(|e| &e.module == module)
            .and_then(|e| e.group.clone())
    }
}
