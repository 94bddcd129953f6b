//! Selection and aggregation over one sibling list
//!
//! Decides which entries of a directory are printed and measures them, so
//! renderers can align columns without a second pass. Entries are never
//! removed: the descriptor keeps the full list plus a visibility mask.

use std::path::PathBuf;

use tracing::trace;

use crate::config::ListingConfig;
use crate::error::LsError;
use crate::ids::{IdLookup, resolve_group, resolve_user};
use crate::tree::{Entry, Stat};

/// Placeholder shown in the flags column; there are no BSD file flags here.
const NO_FLAGS: &str = "-";

/// Long-format strings resolved for one entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub user: String,
    pub group: String,
    pub flags: Option<String>,
}

/// Maxima and totals over the visible entries of one listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldWidths {
    /// Largest block count, in block-size units.
    pub max_blocks: u64,
    pub max_inode: u64,
    pub max_nlink: u64,
    pub max_size: u64,
    pub max_user: usize,
    pub max_group: usize,
    pub max_flags: usize,
    /// Sum of raw 512-byte block counts.
    pub total_blocks: u64,
    /// Some visible entry is a character or block device.
    pub has_device: bool,
}

impl FieldWidths {
    fn absorb(&mut self, stat: &Stat, block_size: u64) {
        let blocks = blocks_in_units(stat.blocks, block_size);
        self.max_blocks = self.max_blocks.max(blocks);
        self.max_inode = self.max_inode.max(stat.ino);
        self.max_nlink = self.max_nlink.max(stat.nlink);
        self.max_size = self.max_size.max(stat.size);
        self.total_blocks = self.total_blocks.saturating_add(stat.blocks);
    }

    fn absorb_annotation(&mut self, annotation: &Annotation) {
        self.max_user = self.max_user.max(annotation.user.chars().count());
        self.max_group = self.max_group.max(annotation.group.chars().count());
        if let Some(flags) = &annotation.flags {
            self.max_flags = self.max_flags.max(flags.chars().count());
        }
    }

    pub fn block_width(&self) -> usize {
        digits(self.max_blocks)
    }

    pub fn inode_width(&self) -> usize {
        digits(self.max_inode)
    }

    pub fn nlink_width(&self) -> usize {
        digits(self.max_nlink)
    }

    pub fn size_width(&self) -> usize {
        digits(self.max_size)
    }

    /// The `total` figure: all blocks converted at once, rounding up.
    pub fn total_in_units(&self, block_size: u64) -> u64 {
        blocks_in_units(self.total_blocks, block_size)
    }
}

/// Convert 512-byte blocks into `block_size` units, rounding up.
pub fn blocks_in_units(blocks: u64, block_size: u64) -> u64 {
    let bytes = blocks.saturating_mul(512);
    bytes.div_ceil(block_size.max(1))
}

/// Number of decimal digits in `n`.
pub fn digits(n: u64) -> usize {
    n.checked_ilog10().map_or(1, |d| d as usize + 1)
}

/// Everything a renderer needs for one listing.
#[derive(Debug)]
pub struct DisplayDescriptor {
    entries: Vec<Entry>,
    visible: Vec<bool>,
    annotations: Vec<Option<Annotation>>,
    /// Number of visible entries.
    pub count: usize,
    pub max_name_len: usize,
    /// This is the batch of root arguments, not a directory's contents.
    pub root: bool,
    /// Present when a metadata-dependent mode is active.
    pub stats: Option<FieldWidths>,
}

impl DisplayDescriptor {
    /// The full sibling list, including suppressed entries.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn is_visible(&self, index: usize) -> bool {
        self.visible.get(index).copied().unwrap_or(false)
    }

    /// Visible entries in order.
    pub fn visible(&self) -> impl Iterator<Item = &Entry> + '_ {
        self.items().map(|(entry, _)| entry)
    }

    /// Visible entries with their long-format annotation, if any.
    pub fn items(&self) -> impl Iterator<Item = (&Entry, Option<&Annotation>)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(i, _)| self.visible[*i])
            .map(|(i, entry)| (entry, self.annotations.get(i).and_then(Option::as_ref)))
    }

    pub fn stats(&self) -> FieldWidths {
        self.stats.unwrap_or_default()
    }
}

/// An entry that could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeProblem {
    pub name: String,
    pub path: PathBuf,
    pub message: String,
}

impl From<NodeProblem> for LsError {
    fn from(problem: NodeProblem) -> Self {
        LsError::Node {
            name: problem.name,
            path: problem.path,
            message: problem.message,
        }
    }
}

/// Result of the selection pass.
#[derive(Debug)]
pub struct Selection {
    /// Entries to report on the error channel, in list order.
    pub problems: Vec<NodeProblem>,
    /// `None` when nothing survived filtering.
    pub descriptor: Option<DisplayDescriptor>,
}

impl DisplayDescriptor {
    /// Filter and measure one sibling list.
    ///
    /// `parent` is `None` for the root-argument batch. There, directories
    /// are deferred to their own section unless `-d` is in effect. Below the
    /// root, hidden and ignored names are dropped instead.
    pub fn build(
        parent: Option<&Entry>,
        entries: Vec<Entry>,
        config: &ListingConfig,
        ids: &dyn IdLookup,
    ) -> Result<Selection, LsError> {
        select(parent, entries, config, ids)
    }
}

fn select(
    parent: Option<&Entry>,
    entries: Vec<Entry>,
    config: &ListingConfig,
    ids: &dyn IdLookup,
) -> Result<Selection, LsError> {
    let needs_stats = config.aggregates_stats();
    let long = config.is_long();
    let block_size = config.output.block_size;

    let mut annotations: Vec<Option<Annotation>> = Vec::new();
    if long {
        annotations
            .try_reserve_exact(entries.len())
            .map_err(|_| LsError::Allocation {
                context: "malloc".to_string(),
            })?;
    }

    let mut visible = vec![false; entries.len()];
    let mut problems = Vec::new();
    let mut stats = FieldWidths::default();
    let mut max_name_len = 0;
    let mut count = 0;

    for (i, entry) in entries.iter().enumerate() {
        if long {
            annotations.push(None);
        }

        if entry.is_problem() {
            problems.push(NodeProblem {
                name: entry.name.clone(),
                path: entry.path.clone(),
                message: entry.error.clone().unwrap_or_default(),
            });
            continue;
        }

        if parent.is_none() {
            if entry.is_dir() && !config.list_dir {
                continue;
            }
        } else if (entry.is_hidden() && !config.show_hidden) || config.ignore.is_ignored(&entry.name) {
            continue;
        }

        if needs_stats {
            let Some(stat) = entry.stat.as_ref() else {
                trace!(path = %entry.path.display(), "no metadata");
                problems.push(NodeProblem {
                    name: entry.name.clone(),
                    path: entry.path.clone(),
                    message: "metadata unavailable".to_string(),
                });
                continue;
            };
            stats.absorb(stat, block_size);
            if long {
                let annotation = Annotation {
                    user: resolve_user(ids, stat.uid, config.numeric_only),
                    group: resolve_group(ids, stat.gid, config.numeric_only),
                    flags: config.output.flags.then(|| NO_FLAGS.to_string()),
                };
                stats.absorb_annotation(&annotation);
                stats.has_device |= stat.is_device();
                annotations[i] = Some(annotation);
            }
        }

        visible[i] = true;
        max_name_len = max_name_len.max(entry.name_len());
        count += 1;
    }

    if count == 0 {
        return Ok(Selection {
            problems,
            descriptor: None,
        });
    }

    Ok(Selection {
        problems,
        descriptor: Some(DisplayDescriptor {
            entries,
            visible,
            annotations,
            count,
            max_name_len,
            root: parent.is_none(),
            stats: needs_stats.then_some(stats),
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::NumericIds;
    use crate::output::DisplayMode;
    use crate::tree::{EntryKind, NameFilter};

    struct Named;

    impl IdLookup for Named {
        fn user_name(&self, _uid: u32) -> Option<String> {
            Some("somebody".to_string())
        }

        fn group_name(&self, _gid: u32) -> Option<String> {
            Some("staff".to_string())
        }
    }

    fn file(name: &str, size: u64, ino: u64, blocks: u64) -> Entry {
        Entry::new(name, name, 1, EntryKind::File).with_stat(Stat {
            size,
            ino,
            blocks,
            nlink: 1,
            uid: 501,
            gid: 20,
            mode: 0o100644,
            ..Default::default()
        })
    }

    fn parent() -> Entry {
        Entry::new("dir", "dir", 0, EntryKind::Directory)
    }

    fn long_config() -> ListingConfig {
        ListingConfig {
            display: DisplayMode::Long,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_list_yields_nothing() {
        let selection = DisplayDescriptor::build(Some(&parent()), Vec::new(), &ListingConfig::default(), &NumericIds).unwrap();
        assert!(selection.descriptor.is_none());
        assert!(selection.problems.is_empty());
    }

    #[test]
    fn test_all_hidden_yields_nothing() {
        let entries = vec![file(".a", 1, 1, 0), file(".b", 1, 2, 0)];
        let selection = DisplayDescriptor::build(Some(&parent()), entries, &ListingConfig::default(), &NumericIds).unwrap();
        assert!(selection.descriptor.is_none());
    }

    #[test]
    fn test_hidden_shown_when_enabled() {
        let config = ListingConfig {
            show_hidden: true,
            ..Default::default()
        };
        let entries = vec![file(".a", 1, 1, 0), file("b", 1, 2, 0)];
        let descriptor = DisplayDescriptor::build(Some(&parent()), entries, &config, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        assert_eq!(descriptor.count, 2);
    }

    #[test]
    fn test_root_batch_defers_directories() {
        let entries = vec![
            Entry::new("c", "c", 0, EntryKind::Directory),
            Entry::new("a", "a", 0, EntryKind::File),
            Entry::new("b", "b", 0, EntryKind::File),
        ];
        let descriptor = DisplayDescriptor::build(None, entries.clone(), &ListingConfig::default(), &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        let names: Vec<&str> = descriptor.visible().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert!(descriptor.root);
        assert_eq!(descriptor.entries().len(), 3);
        assert!(!descriptor.is_visible(0));

        let list_dir = ListingConfig {
            list_dir: true,
            ..Default::default()
        };
        let descriptor = DisplayDescriptor::build(None, entries, &list_dir, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        assert_eq!(descriptor.count, 3);
    }

    #[test]
    fn test_root_batch_keeps_hidden_arguments() {
        let entries = vec![Entry::new(".profile", ".profile", 0, EntryKind::File)];
        let selection = DisplayDescriptor::build(None, entries, &ListingConfig::default(), &NumericIds).unwrap();
        assert_eq!(selection.descriptor.map(|d| d.count), Some(1));
    }

    #[test]
    fn test_problems_reported_and_excluded() {
        let entries = vec![
            file("ok", 5, 1, 0),
            Entry::error("bad".to_string(), "dir/bad".into(), 1, "Permission denied"),
            Entry::not_statable(
                "gone".to_string(),
                "dir/gone".into(),
                1,
                &std::io::Error::from(std::io::ErrorKind::NotFound),
            ),
        ];
        let selection = DisplayDescriptor::build(Some(&parent()), entries, &long_config(), &NumericIds).unwrap();
        let names: Vec<&str> = selection.problems.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["bad", "gone"]);
        assert_eq!(selection.problems[0].message, "Permission denied");
        assert_eq!(selection.descriptor.unwrap().count, 1);
    }

    #[test]
    fn test_widths_ignore_suppressed_entries() {
        let config = long_config();
        let entries = vec![file("a", 10, 7, 8), file("bb", 999, 42, 2)];
        let baseline = DisplayDescriptor::build(Some(&parent()), entries.clone(), &config, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();

        let mut with_hidden = entries;
        with_hidden.push(file(".huge-hidden-name", 123_456_789, 99_999_999, 4096));
        let measured = DisplayDescriptor::build(Some(&parent()), with_hidden, &config, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();

        assert_eq!(baseline.stats, measured.stats);
        assert_eq!(baseline.max_name_len, measured.max_name_len);
        let stats = measured.stats();
        assert_eq!(stats.max_size, 999);
        assert_eq!(stats.max_inode, 42);
        assert_eq!(stats.size_width(), 3);
        assert_eq!(stats.max_blocks, 4);
        assert_eq!(stats.total_blocks, 10);
        assert_eq!(stats.total_in_units(1024), 5);
        assert_eq!(measured.max_name_len, 2);
    }

    #[test]
    fn test_total_rounds_once_over_the_sum() {
        let entries = vec![file("a", 1, 1, 1), file("b", 1, 2, 1), file("c", 1, 3, 1)];
        let stats = DisplayDescriptor::build(Some(&parent()), entries, &long_config(), &NumericIds)
            .unwrap()
            .descriptor
            .unwrap()
            .stats();
        assert_eq!(stats.max_blocks, 1);
        assert_eq!(stats.total_blocks, 3);
        assert_eq!(stats.total_in_units(1024), 2);
        assert_eq!(stats.total_in_units(512), 3);
    }

    #[test]
    fn test_stats_absent_without_metadata_modes() {
        let entries = vec![Entry::new("a", "a", 1, EntryKind::File)];
        let descriptor = DisplayDescriptor::build(Some(&parent()), entries, &ListingConfig::default(), &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        assert!(descriptor.stats.is_none());
        assert!(descriptor.items().all(|(_, annotation)| annotation.is_none()));
    }

    #[test]
    fn test_numeric_only_ignores_successful_lookup() {
        let entries = vec![file("a", 1, 1, 0)];
        let named = DisplayDescriptor::build(Some(&parent()), entries.clone(), &long_config(), &Named)
            .unwrap()
            .descriptor
            .unwrap();
        let (_, annotation) = named.items().next().unwrap();
        assert_eq!(annotation.unwrap().user, "somebody");

        let numeric = ListingConfig {
            numeric_only: true,
            ..long_config()
        };
        let descriptor = DisplayDescriptor::build(Some(&parent()), entries, &numeric, &Named)
            .unwrap()
            .descriptor
            .unwrap();
        let (_, annotation) = descriptor.items().next().unwrap();
        let annotation = annotation.unwrap();
        assert_eq!(annotation.user, "501");
        assert_eq!(annotation.group, "20");
        assert_eq!(descriptor.stats().max_user, 3);
    }

    #[test]
    fn test_device_flag_and_flags_column() {
        let mut config = long_config();
        config.output.flags = true;
        let mut tty = file("tty0", 0, 3, 0);
        if let Some(stat) = tty.stat.as_mut() {
            stat.mode = 0o020620;
        }
        let descriptor = DisplayDescriptor::build(Some(&parent()), vec![tty, file("a", 1, 1, 0)], &config, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        let stats = descriptor.stats();
        assert!(stats.has_device);
        assert_eq!(stats.max_flags, 1);
    }

    #[test]
    fn test_ignore_patterns_below_root() {
        let config = ListingConfig {
            ignore: NameFilter::new(&["*.o"]),
            ..Default::default()
        };
        let entries = vec![file("main.o", 1, 1, 0), file("main.c", 1, 2, 0)];
        let descriptor = DisplayDescriptor::build(Some(&parent()), entries, &config, &NumericIds)
            .unwrap()
            .descriptor
            .unwrap();
        let names: Vec<&str> = descriptor.visible().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["main.c"]);
    }

    #[test]
    fn test_block_units_round_up() {
        assert_eq!(blocks_in_units(0, 1024), 0);
        assert_eq!(blocks_in_units(1, 1024), 1);
        assert_eq!(blocks_in_units(8, 1024), 4);
        assert_eq!(blocks_in_units(8, 512), 8);
        assert_eq!(digits(0), 1);
        assert_eq!(digits(9), 1);
        assert_eq!(digits(10), 2);
        assert_eq!(digits(123_456), 6);
    }
}
