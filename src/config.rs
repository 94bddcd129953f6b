//! The immutable configuration for one listing run

use std::path::PathBuf;

use crate::output::{DisplayMode, OutputConfig};
use crate::tree::{FieldComparator, NameFilter, OrderingPolicy, SortKey, SymlinkMode, WalkOptions};

/// Everything a run needs to know, built once from the command line.
#[derive(Debug, Clone)]
pub struct ListingConfig {
    pub display: DisplayMode,
    pub sort: SortKey,
    pub reverse: bool,
    /// List entries whose names start with `.`.
    pub show_hidden: bool,
    /// Also synthesize `.` and `..`.
    pub see_dot: bool,
    pub recursive: bool,
    /// List directories themselves, not their contents.
    pub list_dir: bool,
    /// Never resolve uids and gids to names.
    pub numeric_only: bool,
    pub symlinks: SymlinkMode,
    /// `-g`: accepted for compatibility, no effect.
    pub compat_g: bool,
    /// `-W`: accepted, there are no whiteouts to show on this platform.
    pub whiteout: bool,
    pub roots: Vec<PathBuf>,
    pub ignore: NameFilter,
    pub output: OutputConfig,
}

impl ListingConfig {
    pub fn is_long(&self) -> bool {
        self.display == DisplayMode::Long
    }

    /// Whether the aggregation pass measures stat-derived columns.
    pub fn aggregates_stats(&self) -> bool {
        self.is_long() || self.output.inode || self.output.blocks
    }

    /// Whether any part of the run needs stat metadata at all.
    pub fn needs_stats(&self) -> bool {
        self.aggregates_stats() || self.output.has_indicator() || self.sort.needs_stats()
    }

    /// Symlinks named on the command line are followed unless the listing
    /// describes the links themselves.
    pub fn follow_command_line_links(&self) -> bool {
        !self.is_long() && !self.list_dir && !self.output.classify
    }

    pub fn ordering(&self) -> OrderingPolicy {
        OrderingPolicy::new(FieldComparator::new(self.sort, self.reverse), self.list_dir)
    }

    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions {
            symlinks: self.symlinks,
            follow_root_links: self.follow_command_line_links(),
            see_dot: self.see_dot,
            no_stat: !self.needs_stats(),
            read_links: self.is_long(),
        }
    }

    pub fn multiple_roots(&self) -> bool {
        self.roots.len() > 1
    }
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            display: DisplayMode::default(),
            sort: SortKey::default(),
            reverse: false,
            show_hidden: false,
            see_dot: false,
            recursive: false,
            list_dir: false,
            numeric_only: false,
            symlinks: SymlinkMode::default(),
            compat_g: false,
            whiteout: false,
            roots: vec![PathBuf::from(".")],
            ignore: NameFilter::default(),
            output: OutputConfig::default(),
        }
    }
}
