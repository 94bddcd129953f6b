//! Output configuration types

use crate::tree::TimeField;

const DEFAULT_TERM_WIDTH: usize = 80;
const DEFAULT_BLOCK_SIZE: u64 = 1024;

/// Which layout renders a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DisplayMode {
    /// One entry per line (`-1`).
    #[default]
    SingleColumn,
    /// Multi-column, sorted down the columns (`-C`).
    Columns,
    /// Multi-column, sorted across the rows (`-x`).
    Across,
    /// Comma-separated stream (`-m`).
    Stream,
    /// Long format (`-l`, `-n`).
    Long,
}

/// Configuration for rendering.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub use_color: bool,
    pub term_width: usize,
    /// Prefix each name with its inode number.
    pub inode: bool,
    /// Prefix each name with its block count.
    pub blocks: bool,
    /// Append a type indicator (`/`, `*`, `@`, `=`, `|`).
    pub classify: bool,
    /// Append `/` to directories only.
    pub slash_dirs: bool,
    /// Print non-printable characters in names as `?`.
    pub nonprint: bool,
    /// Full timestamps in the long format.
    pub full_time: bool,
    /// Show the file flags column in the long format.
    pub flags: bool,
    pub time: TimeField,
    /// Unit for block counts, in bytes.
    pub block_size: u64,
}

impl OutputConfig {
    /// Whether names carry a trailing indicator character.
    pub fn has_indicator(&self) -> bool {
        self.classify || self.slash_dirs
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_color: false,
            term_width: DEFAULT_TERM_WIDTH,
            inode: false,
            blocks: false,
            classify: false,
            slash_dirs: false,
            nonprint: false,
            full_time: false,
            flags: false,
            time: TimeField::default(),
            block_size: DEFAULT_BLOCK_SIZE,
        }
    }
}
