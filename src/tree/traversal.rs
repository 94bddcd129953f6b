//! Traversal controller
//!
//! Drives a [`TreeWalker`]: renders the root batch, then one section per
//! directory entered, printing headers and cutting off descent when the
//! listing is not recursive. Per-node failures are reported and remembered;
//! only walk-level failures end the run early.

use std::io::Write;

use termcolor::WriteColor;
use tracing::debug;

use crate::config::ListingConfig;
use crate::error::LsError;
use crate::ids::IdLookup;
use crate::output::{DisplayDescriptor, Render, Renderer, renderer_for};

use super::entry::Entry;
use super::walker::{TreeWalker, WalkEvent};

/// What a run has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStatus {
    failed: bool,
    /// Some section has been printed; later headers get a blank line first.
    output: bool,
}

impl RunStatus {
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn fail(&mut self) {
        self.failed = true;
    }

    pub fn exit_code(&self) -> u8 {
        u8::from(self.failed)
    }
}

/// One listing run over the configured roots.
pub struct Traversal<'a> {
    config: &'a ListingConfig,
    ids: &'a dyn IdLookup,
    renderer: Renderer,
    status: RunStatus,
}

impl<'a> Traversal<'a> {
    pub fn new(config: &'a ListingConfig, ids: &'a dyn IdLookup) -> Self {
        Self {
            config,
            ids,
            renderer: renderer_for(config),
            status: RunStatus::default(),
        }
    }

    /// Walk every root, writing listings to `out` and per-node errors to
    /// `err`.
    pub fn run<W: WriteColor, E: Write>(&mut self, out: &mut W, err: &mut E) -> Result<RunStatus, LsError> {
        let walker = TreeWalker::open(&self.config.roots, self.config.walk_options(), self.config.ordering())?;
        self.walk(walker, out, err)
    }

    fn walk<W: WriteColor, E: Write>(
        &mut self,
        mut walker: TreeWalker,
        out: &mut W,
        err: &mut E,
    ) -> Result<RunStatus, LsError> {
        self.display(None, walker.roots().to_vec(), out, err)?;
        if self.config.list_dir {
            return Ok(self.status);
        }

        let names_only = !self.config.recursive && !self.config.needs_stats();

        while let Some(event) = walker.next() {
            match event? {
                WalkEvent::Directory(dir) => {
                    if !dir.is_root()
                        && ((dir.is_hidden() && !self.config.show_hidden) || self.config.ignore.is_ignored(&dir.name))
                    {
                        debug!(path = %dir.path.display(), "skipping filtered directory");
                        walker.skip_descent();
                        continue;
                    }

                    if self.status.output {
                        writeln!(out, "\n{}:", dir.path.display())?;
                    } else if self.config.multiple_roots() {
                        writeln!(out, "{}:", dir.path.display())?;
                        self.status.output = true;
                    }

                    match walker.children(&dir, names_only) {
                        Ok(children) => {
                            self.display(Some(&dir), children, out, err)?;
                            if !self.config.recursive {
                                walker.skip_descent();
                            }
                        }
                        // the walk reports the unreadable directory itself
                        Err(e) => debug!(path = %dir.path.display(), error = %e, "cannot read children"),
                    }
                }
                WalkEvent::Cycle(dir) => {
                    writeln!(err, "{}", LsError::Cycle { name: dir.name, path: dir.path })?;
                    self.status.fail();
                }
                WalkEvent::NodeError { name, message, .. } => {
                    writeln!(err, "{}: {}", name, message)?;
                    self.status.fail();
                }
            }
        }

        Ok(self.status)
    }

    /// Select, measure and render one sibling list.
    fn display<W: WriteColor, E: Write>(
        &mut self,
        parent: Option<&Entry>,
        entries: Vec<Entry>,
        out: &mut W,
        err: &mut E,
    ) -> Result<(), LsError> {
        let selection = match DisplayDescriptor::build(parent, entries, self.config, self.ids) {
            Ok(selection) => selection,
            Err(e) if e.is_recoverable() => {
                writeln!(err, "{}", e)?;
                self.status.fail();
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        for problem in selection.problems {
            writeln!(err, "{}", LsError::from(problem))?;
            self.status.fail();
        }

        if let Some(listing) = selection.descriptor {
            self.renderer.render(&listing, out)?;
            self.status.output = true;
        }
        Ok(())
    }
}
