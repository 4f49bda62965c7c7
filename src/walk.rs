//! Filesystem-backed path enumeration.

use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::error::{Result, TreeError};
use crate::source::{PathSource, ScanEntry};

/// A [`PathSource`] over a real directory tree.
///
/// Each drive walks the whole tree again in deterministic name-sorted
/// order, yielding directories as well as files; the root itself is not
/// yielded. Unreadable entries are skipped and counted per drive.
pub struct WalkSource {
    root: PathBuf,
    errors: usize,
}

impl WalkSource {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let meta = match std::fs::metadata(&root) {
            Ok(meta) => meta,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TreeError::RootNotFound(root));
            }
            Err(err) => return Err(err.into()),
        };
        if !meta.is_dir() {
            return Err(TreeError::RootNotDirectory(root));
        }
        Ok(Self { root, errors: 0 })
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Entries skipped as unreadable during the most recent drive.
    #[inline]
    pub fn errors(&self) -> usize {
        self.errors
    }
}

impl PathSource for WalkSource {
    fn iterate(&mut self, visit: &mut dyn FnMut(&ScanEntry) -> bool) {
        self.errors = 0;
        let walk = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();
        for result in walk {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    self.errors += 1;
                    log::debug!("skipping unreadable entry: {err}");
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let scan = ScanEntry {
                path: entry.into_path(),
                is_dir,
            };
            if !visit(&scan) {
                break;
            }
        }
    }
}
