//! Batch builds.
//!
//! `ScanDriver` drives a [`PathSource`] through a [`TreeBuilder`] in two
//! passes (count, then build), applying the mark predicate, maintaining the
//! run counters, and publishing progress through shared atomics. The tree
//! has a single mutator; only the counters are readable concurrently.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::arena::NodeId;
use crate::builder::TreeBuilder;
use crate::settings::ViewSettings;
use crate::source::{Marker, ModuleResolver, PathSource};
use crate::tree::FileTree;

/// Counter snapshot of one batch build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanTotals {
    pub total_files: usize,
    pub scanned_files: usize,
    pub scanned_dirs: usize,
    pub marked_files: usize,
    pub cancelled: bool,
}

/// Shared counters for observing a build while it runs.
///
/// Updated with relaxed ordering; a snapshot is consistent enough for
/// progress display, no more.
#[derive(Debug, Default)]
pub struct ScanProgress {
    total_files: AtomicUsize,
    scanned_files: AtomicUsize,
    scanned_dirs: AtomicUsize,
    marked_files: AtomicUsize,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self::default()
    }

    fn set_total(&self, total: usize) {
        self.total_files.store(total, Ordering::Relaxed);
    }

    fn file_scanned(&self, marked: bool) {
        self.scanned_files.fetch_add(1, Ordering::Relaxed);
        if marked {
            self.marked_files.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn dir_scanned(&self) {
        self.scanned_dirs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_files: self.total_files.load(Ordering::Relaxed),
            scanned_files: self.scanned_files.load(Ordering::Relaxed),
            scanned_dirs: self.scanned_dirs.load(Ordering::Relaxed),
            marked_files: self.marked_files.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time reading of a [`ScanProgress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub total_files: usize,
    pub scanned_files: usize,
    pub scanned_dirs: usize,
    pub marked_files: usize,
}

impl ProgressSnapshot {
    /// Scanned fraction of the known total; zero while no total is known.
    pub fn fraction(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.scanned_files as f64 / self.total_files as f64
        }
    }
}

/// Drives batch builds against a borrowed builder.
pub struct ScanDriver<'d, 'a> {
    builder: &'d mut TreeBuilder<'a>,
    progress: Option<&'d ScanProgress>,
    cancel: Option<&'d AtomicBool>,
    total_hint: Option<usize>,
}

impl<'d, 'a> ScanDriver<'d, 'a> {
    pub fn new(builder: &'d mut TreeBuilder<'a>) -> Self {
        Self {
            builder,
            progress: None,
            cancel: None,
            total_hint: None,
        }
    }

    pub fn with_progress(mut self, progress: &'d ScanProgress) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: &'d AtomicBool) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Supplies a previously computed file total, skipping the count pass.
    pub fn with_total_hint(mut self, total: usize) -> Self {
        self.total_hint = Some(total);
        self
    }

    /// Full build: count pass (unless a total hint was supplied), then one
    /// insertion pass over the source, then the sort pass.
    ///
    /// Counters track the enumeration, not the tree: every leaf seen bumps
    /// `scanned_files`, and every marker hit bumps `marked_files`, whether
    /// or not the leaf is inserted. Cancellation is checked between items
    /// and leaves a consistent, partially built tree.
    pub fn run(self, source: &mut dyn PathSource, marker: &dyn Marker) -> ScanTotals {
        let total = match self.total_hint {
            Some(total) => total,
            None => count_files(source, self.cancel),
        };
        if let Some(progress) = self.progress {
            progress.set_total(total);
        }

        let include_unmarked = self.builder.settings().include_unmarked;
        let compact = self.builder.settings().compact_empty_middle_packages;
        let mut totals = ScanTotals {
            total_files: total,
            ..ScanTotals::default()
        };

        // Attachment node of the previous leaf, reused while consecutive
        // leaves share a parent. Only engaged with compaction off; a fold
        // split must go through full resolution.
        let mut last: Option<(PathBuf, NodeId)> = None;

        source.iterate(&mut |entry| {
            if self.cancelled() {
                totals.cancelled = true;
                return false;
            }
            if entry.is_dir {
                totals.scanned_dirs += 1;
                if let Some(progress) = self.progress {
                    progress.dir_scanned();
                }
                last = None;
                return true;
            }

            totals.scanned_files += 1;
            let marked = marker.is_marked(&entry.path);
            if marked {
                totals.marked_files += 1;
            }
            if let Some(progress) = self.progress {
                progress.file_scanned(marked);
            }
            if !marked && !include_unmarked {
                last = None;
                return true;
            }

            let memo = last.as_ref().and_then(|(parent, node)| {
                (!compact && entry.path.parent() == Some(parent.as_path())).then_some(*node)
            });
            let dir = match memo {
                Some(node) => Some(self.builder.insert_leaf_at(node, &entry.path, marked)),
                None => self.builder.insert_leaf(&entry.path, marked),
            };
            last = match (dir, entry.path.parent()) {
                (Some(node), Some(parent)) => Some((parent.to_path_buf(), node)),
                _ => None,
            };
            true
        });

        self.builder.ensure_sorted();
        log::info!(
            "tree build finished: {} of {} files scanned, {} marked, {} directories{}",
            totals.scanned_files,
            totals.total_files,
            totals.marked_files,
            totals.scanned_dirs,
            if totals.cancelled { ", cancelled" } else { "" }
        );
        totals
    }

    /// Build from an explicit path list instead of an enumerator. A
    /// singleton list forces file nodes visible so the lone path has a
    /// selectable node.
    pub fn run_paths(self, paths: &[PathBuf], marker: &dyn Marker) -> ScanTotals {
        if paths.len() == 1 {
            self.builder.set_show_files(true);
        }
        if let Some(progress) = self.progress {
            progress.set_total(paths.len());
        }

        let include_unmarked = self.builder.settings().include_unmarked;
        let mut totals = ScanTotals {
            total_files: paths.len(),
            ..ScanTotals::default()
        };
        for path in paths {
            if self.cancelled() {
                totals.cancelled = true;
                break;
            }
            totals.scanned_files += 1;
            let marked = marker.is_marked(path);
            if marked {
                totals.marked_files += 1;
            }
            if let Some(progress) = self.progress {
                progress.file_scanned(marked);
            }
            if marked || include_unmarked {
                self.builder.insert_leaf(path, marked);
            }
        }

        self.builder.ensure_sorted();
        totals
    }

    fn cancelled(&self) -> bool {
        self.cancel.is_some_and(|c| c.load(Ordering::Relaxed))
    }
}

fn count_files(source: &mut dyn PathSource, cancel: Option<&AtomicBool>) -> usize {
    let mut count = 0usize;
    source.iterate(&mut |entry| {
        if cancel.is_some_and(|c| c.load(Ordering::Relaxed)) {
            return false;
        }
        if !entry.is_dir {
            count += 1;
        }
        true
    });
    count
}

/// Finished build artifact: the sorted tree plus the totals a rendering
/// layer shows next to it.
#[derive(Debug)]
pub struct TreeModel {
    pub tree: FileTree,
    pub scanned: usize,
    pub marked: usize,
}

impl TreeModel {
    pub fn from_build(tree: FileTree, totals: &ScanTotals) -> Self {
        Self {
            tree,
            scanned: totals.scanned_files,
            marked: totals.marked_files,
        }
    }
}

/// One-shot batch build: fresh builder, full scan, finished model.
pub fn build_model(
    settings: ViewSettings,
    modules: &dyn ModuleResolver,
    source: &mut dyn PathSource,
    marker: &dyn Marker,
) -> TreeModel {
    let mut builder = TreeBuilder::new(settings, modules);
    let totals = ScanDriver::new(&mut builder).run(source, marker);
    TreeModel::from_build(builder.into_tree(), &totals)
}
