//! TreeWalker - fts-style sequencing over `walkdir`
//!
//! `walkdir` provides the depth-first walk, the sort callback, loop
//! detection and `skip_current_dir`. This adapter adds what a listing needs
//! on top: a sorted batch of root arguments, a children fetch for the
//! directory just entered, and events that separate per-node failures from
//! fatal ones.

use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::ffi::OsString;
use std::fs::{self, DirEntry};
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{LsError, describe_io_error};

use super::config::WalkOptions;
use super::entry::{Entry, EntryKind};
use super::order::OrderingPolicy;

/// One step of the traversal.
#[derive(Debug, Clone)]
pub enum WalkEvent {
    /// A directory is being entered (pre-order).
    Directory(Entry),
    /// A directory that is its own ancestor. It is not descended into.
    Cycle(Entry),
    /// A node that could not be read, usually a directory that cannot be
    /// opened.
    NodeError {
        name: String,
        path: PathBuf,
        message: String,
    },
}

/// Walks root arguments in policy order, yielding directory events.
pub struct TreeWalker {
    options: WalkOptions,
    policy: OrderingPolicy,
    roots: Vec<Entry>,
    pending: VecDeque<Entry>,
    current: Option<(Entry, walkdir::IntoIter)>,
}

impl TreeWalker {
    /// Stat every root argument and sort them with `policy`.
    ///
    /// Roots that cannot be stat-ed are kept as not-stat-able entries so
    /// the caller can report them. Only an empty root list or an empty path
    /// fails the whole walk.
    pub fn open(roots: &[PathBuf], options: WalkOptions, policy: OrderingPolicy) -> Result<Self, LsError> {
        if roots.is_empty() {
            return Err(LsError::WalkOpen {
                message: "no paths to list".to_string(),
            });
        }
        if roots.iter().any(|root| root.as_os_str().is_empty()) {
            return Err(LsError::WalkOpen {
                message: describe_io_error(&io::Error::from(io::ErrorKind::NotFound)),
            });
        }

        let mut entries: Vec<Entry> = roots
            .iter()
            .map(|root| {
                let name = root.to_string_lossy().into_owned();
                let mut entry = Entry::probe(name, root.clone(), 0, options.follows_roots());
                if options.read_links {
                    entry.resolve_link_target();
                }
                entry
            })
            .collect();
        policy.sort(&mut entries);

        let pending = entries.iter().filter(|e| e.is_dir()).cloned().collect();
        debug!(roots = entries.len(), ?policy, "opened walk");

        Ok(Self {
            options,
            policy,
            roots: entries,
            pending,
            current: None,
        })
    }

    /// The root arguments, sorted.
    pub fn roots(&self) -> &[Entry] {
        &self.roots
    }

    /// Immediate children of `dir`, sorted by the policy.
    ///
    /// With `names_only` (or when the walk was opened without stats) the
    /// entries carry a kind but no metadata. An error opening `dir` is
    /// returned as is; the walk itself reports it when it tries to descend.
    pub fn children(&self, dir: &Entry, names_only: bool) -> io::Result<Vec<Entry>> {
        let level = dir.level + 1;
        let with_stat = !names_only && !self.options.no_stat;
        let mut entries = Vec::new();

        if self.options.see_dot {
            for name in [".", ".."] {
                entries.push(self.child(name.to_string(), dir.path.join(name), level, None, with_stat));
            }
        }

        for dent in fs::read_dir(&dir.path)? {
            match dent {
                Ok(dent) => entries.push(self.child_from_dirent(&dent, level, with_stat)),
                Err(e) => entries.push(Entry::error(
                    dir.name.clone(),
                    dir.path.clone(),
                    level,
                    describe_io_error(&e),
                )),
            }
        }

        self.policy.sort(&mut entries);
        trace!(path = %dir.path.display(), count = entries.len(), "fetched children");
        Ok(entries)
    }

    /// Do not descend into the directory most recently yielded.
    pub fn skip_descent(&mut self) {
        if let Some((_, iter)) = self.current.as_mut() {
            iter.skip_current_dir();
        }
    }

    fn child_from_dirent(&self, dent: &DirEntry, level: usize, with_stat: bool) -> Entry {
        let name = dent.file_name().to_string_lossy().into_owned();
        self.child(name, dent.path(), level, dent.file_type().ok(), with_stat)
    }

    fn child(
        &self,
        name: String,
        path: PathBuf,
        level: usize,
        file_type: Option<fs::FileType>,
        with_stat: bool,
    ) -> Entry {
        if !with_stat {
            if let Some(ft) = file_type {
                return Entry::from_file_type(name, path, level, ft);
            }
        }
        let mut entry = Entry::probe(name, path, level, self.options.follows_links());
        if self.options.read_links {
            entry.resolve_link_target();
        }
        entry
    }

    fn walk_root(&self, root: &Path) -> walkdir::IntoIter {
        let mut walk = WalkDir::new(root)
            .follow_links(self.options.follows_links())
            .follow_root_links(self.options.follows_roots());

        if !self.policy.is_unsorted() {
            let policy = self.policy;
            if policy.field().key.needs_stats() {
                let mut snapshots = Snapshots::default();
                walk = walk.sort_by(move |a, b| snapshots.compare(&policy, a, b));
            } else {
                walk = walk.sort_by(move |a, b| policy.compare(&sort_entry(a, false), &sort_entry(b, false)));
            }
        }
        walk.into_iter()
    }

    fn classify(&self, root: &Entry, err: walkdir::Error) -> Option<Result<WalkEvent, LsError>> {
        let depth = err.depth();
        let Some(path) = err.path().map(Path::to_path_buf) else {
            return Some(Err(LsError::WalkRead {
                message: err.to_string(),
            }));
        };
        let name = if depth == 0 {
            root.name.clone()
        } else {
            file_name(&path)
        };

        if err.loop_ancestor().is_some() {
            let entry = Entry::new(name, path, depth, EntryKind::Directory);
            return Some(Ok(WalkEvent::Cycle(entry)));
        }

        // A dangling link in logical mode is listed as the link itself.
        if self.options.follows_links() && is_dangling_link(&path) {
            trace!(path = %path.display(), "dangling symlink");
            return None;
        }

        let message = match err.io_error() {
            Some(io_err) => describe_io_error(io_err),
            None => err.to_string(),
        };
        Some(Ok(WalkEvent::NodeError { name, path, message }))
    }
}

impl Iterator for TreeWalker {
    type Item = Result<WalkEvent, LsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current.is_none() {
                let root = self.pending.pop_front()?;
                debug!(root = %root.path.display(), "walking root");
                let iter = self.walk_root(&root.path);
                self.current = Some((root, iter));
            }
            let (root, iter) = self.current.as_mut()?;

            match iter.next() {
                None => {
                    self.current = None;
                }
                Some(Ok(dent)) => {
                    if !dent.file_type().is_dir() {
                        continue;
                    }
                    let entry = if dent.depth() == 0 {
                        root.clone()
                    } else {
                        Entry::from_file_type(
                            file_name(dent.path()),
                            dent.path().to_path_buf(),
                            dent.depth(),
                            dent.file_type(),
                        )
                    };
                    return Some(Ok(WalkEvent::Directory(entry)));
                }
                Some(Err(err)) => {
                    let root = root.clone();
                    if let Some(event) = self.classify(&root, err) {
                        return Some(event);
                    }
                }
            }
        }
    }
}

/// Entry used only as a sort key inside `walkdir`'s callback.
fn sort_entry(dent: &walkdir::DirEntry, with_stat: bool) -> Entry {
    let name = dent.file_name().to_string_lossy().into_owned();
    let path = dent.path().to_path_buf();
    if !with_stat {
        return Entry::from_file_type(name, path, dent.depth(), dent.file_type());
    }
    match dent.metadata() {
        Ok(meta) => Entry::from_metadata(name, path, dent.depth(), &meta),
        Err(e) => Entry::not_statable(name, path, dent.depth(), &io::Error::from(e)),
    }
}

/// Metadata for the siblings `walkdir` is currently sorting, taken once per
/// entry so every comparison sees the same values.
#[derive(Debug, Default)]
struct Snapshots {
    parent: PathBuf,
    entries: HashMap<OsString, Entry>,
}

impl Snapshots {
    fn compare(&mut self, policy: &OrderingPolicy, a: &walkdir::DirEntry, b: &walkdir::DirEntry) -> Ordering {
        let parent = a.path().parent().unwrap_or_else(|| Path::new(""));
        if self.parent != parent {
            self.parent = parent.to_path_buf();
            self.entries.clear();
        }
        for dent in [a, b] {
            if !self.entries.contains_key(dent.file_name()) {
                self.entries
                    .insert(dent.file_name().to_os_string(), sort_entry(dent, true));
            }
        }
        policy.compare(&self.entries[a.file_name()], &self.entries[b.file_name()])
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

fn is_dangling_link(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) && fs::metadata(path).is_err()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::config::SymlinkMode;
    use crate::tree::order::{FieldComparator, SortKey};
    use tempfile::TempDir;

    fn name_policy() -> OrderingPolicy {
        OrderingPolicy::new(FieldComparator::new(SortKey::Name, false), false)
    }

    fn directories(walker: &mut TreeWalker) -> Vec<String> {
        let mut seen = Vec::new();
        for event in walker.by_ref() {
            if let Ok(WalkEvent::Directory(dir)) = event {
                seen.push(dir.path.to_string_lossy().into_owned());
            }
        }
        seen
    }

    #[test]
    fn test_open_rejects_empty_roots() {
        let err = TreeWalker::open(&[], WalkOptions::default(), name_policy()).err();
        assert!(matches!(err, Some(LsError::WalkOpen { .. })));

        let err = TreeWalker::open(&[PathBuf::new()], WalkOptions::default(), name_policy()).err();
        assert!(matches!(err, Some(LsError::WalkOpen { .. })));
    }

    #[test]
    fn test_roots_sorted_with_directories_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), "").unwrap();
        fs::create_dir(dir.path().join("c")).unwrap();
        fs::write(dir.path().join("b"), "").unwrap();

        let roots: Vec<PathBuf> = ["b", "c", "a"].iter().map(|n| dir.path().join(n)).collect();
        let walker = TreeWalker::open(&roots, WalkOptions::default(), name_policy()).unwrap();
        let kinds: Vec<EntryKind> = walker.roots().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [EntryKind::Directory, EntryKind::File, EntryKind::File]);
        assert!(walker.roots()[1].name.ends_with('a'));
    }

    #[test]
    fn test_missing_root_is_not_statable() {
        let dir = TempDir::new().unwrap();
        let walker =
            TreeWalker::open(&[dir.path().join("missing")], WalkOptions::default(), name_policy()).unwrap();
        assert!(walker.roots()[0].is_not_statable());
    }

    #[test]
    fn test_children_names_only_and_see_dot() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b"), "bb").unwrap();
        fs::write(dir.path().join("a"), "a").unwrap();

        let options = WalkOptions {
            see_dot: true,
            no_stat: true,
            ..Default::default()
        };
        let walker = TreeWalker::open(&[dir.path().to_path_buf()], options, name_policy()).unwrap();
        let children = walker.children(&walker.roots()[0], true).unwrap();
        let names: Vec<&str> = children.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, [".", "..", "a", "b"]);
        assert!(children.iter().skip(2).all(|e| e.stat.is_none() && e.level == 1));
    }

    #[test]
    fn test_children_with_stats_sorted_by_size() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 10]).unwrap();

        let policy = OrderingPolicy::new(FieldComparator::new(SortKey::Size, true), false);
        let walker = TreeWalker::open(&[dir.path().to_path_buf()], WalkOptions::default(), policy).unwrap();
        let children = walker.children(&walker.roots()[0], false).unwrap();
        let sizes: Vec<u64> = children.iter().filter_map(|e| e.stat.as_ref().map(|s| s.size)).collect();
        assert_eq!(sizes, [100, 10]);
    }

    #[test]
    fn test_walk_visits_directories_in_order() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("b/inner")).unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::write(dir.path().join("file"), "").unwrap();

        let mut walker =
            TreeWalker::open(&[dir.path().to_path_buf()], WalkOptions::default(), name_policy()).unwrap();
        let seen = directories(&mut walker);
        let root = dir.path().to_string_lossy().into_owned();
        assert_eq!(
            seen,
            [
                root.clone(),
                format!("{root}/a"),
                format!("{root}/b"),
                format!("{root}/b/inner"),
            ]
        );
    }

    #[test]
    fn test_skip_descent_stops_at_root() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();

        let mut walker =
            TreeWalker::open(&[dir.path().to_path_buf()], WalkOptions::default(), name_policy()).unwrap();
        let first = walker.next();
        assert!(matches!(first, Some(Ok(WalkEvent::Directory(ref d))) if d.is_root()));
        walker.skip_descent();
        assert!(walker.next().is_none());
    }

    #[test]
    fn test_sort_keys_are_stat_ed_once_per_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 10]).unwrap();
        fs::write(dir.path().join("b"), vec![0u8; 100]).unwrap();

        let dents: Vec<walkdir::DirEntry> = WalkDir::new(dir.path())
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .map(Result::unwrap)
            .collect();
        let policy = OrderingPolicy::new(FieldComparator::new(SortKey::Size, false), false);

        let mut snapshots = Snapshots::default();
        assert_eq!(snapshots.compare(&policy, &dents[0], &dents[1]), Ordering::Less);

        // a file growing mid-sort must not flip an earlier answer
        fs::write(dir.path().join("a"), vec![0u8; 1000]).unwrap();
        assert_eq!(snapshots.compare(&policy, &dents[0], &dents[1]), Ordering::Less);
        assert_eq!(snapshots.compare(&policy, &dents[1], &dents[0]), Ordering::Greater);
        assert_eq!(snapshots.entries.len(), 2);
    }

    #[test]
    fn test_logical_walk_reports_cycle() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("loop")).unwrap();
        std::os::unix::fs::symlink("..", dir.path().join("loop/up")).unwrap();

        let options = WalkOptions {
            symlinks: SymlinkMode::Logical,
            ..Default::default()
        };
        let walker = TreeWalker::open(&[dir.path().to_path_buf()], options, name_policy()).unwrap();
        let cycles: Vec<String> = walker
            .filter_map(|event| match event {
                Ok(WalkEvent::Cycle(entry)) => Some(entry.name),
                _ => None,
            })
            .collect();
        assert_eq!(cycles, ["up"]);
    }
}
