//! Configuration types for the tree walker

/// How symbolic links are treated during the walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SymlinkMode {
    /// Report links themselves and never descend through them.
    #[default]
    Physical,
    /// Follow links, reporting what they point to.
    Logical,
}

/// Options passed through to the walk primitive.
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    pub symlinks: SymlinkMode,
    /// Follow symlinks named directly as roots even in physical mode.
    pub follow_root_links: bool,
    /// Synthesize `.` and `..` in every children listing.
    pub see_dot: bool,
    /// Skip stat calls when nothing downstream needs metadata.
    pub no_stat: bool,
    /// Read symlink targets while fetching children.
    pub read_links: bool,
}

impl WalkOptions {
    pub fn follows_links(&self) -> bool {
        self.symlinks == SymlinkMode::Logical
    }

    /// Whether root arguments are stat-ed through symlinks.
    pub fn follows_roots(&self) -> bool {
        self.follows_links() || self.follow_root_links
    }
}
