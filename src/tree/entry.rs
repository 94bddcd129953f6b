//! Filesystem entries discovered during a walk

use std::fs::{self, FileType, Metadata};
use std::io;
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::PathBuf;

use crate::error::describe_io_error;

/// A timestamp with nanosecond precision, ordered oldest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileTime {
    pub secs: i64,
    pub nanos: i64,
}

impl FileTime {
    pub fn new(secs: i64, nanos: i64) -> Self {
        Self { secs, nanos }
    }
}

/// Stat metadata for an entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stat {
    pub size: u64,
    /// Allocated blocks in 512-byte units.
    pub blocks: u64,
    pub ino: u64,
    pub nlink: u64,
    pub uid: u32,
    pub gid: u32,
    pub mode: u32,
    pub rdev: u64,
    pub mtime: FileTime,
    pub atime: FileTime,
    pub ctime: FileTime,
}

const S_IFMT: u32 = 0o170000;
const S_IFCHR: u32 = 0o020000;
const S_IFBLK: u32 = 0o060000;

impl Stat {
    pub fn from_metadata(meta: &Metadata) -> Self {
        Self {
            size: meta.size(),
            blocks: meta.blocks(),
            ino: meta.ino(),
            nlink: meta.nlink(),
            uid: meta.uid(),
            gid: meta.gid(),
            mode: meta.mode(),
            rdev: meta.rdev(),
            mtime: FileTime::new(meta.mtime(), meta.mtime_nsec()),
            atime: FileTime::new(meta.atime(), meta.atime_nsec()),
            ctime: FileTime::new(meta.ctime(), meta.ctime_nsec()),
        }
    }

    /// Character or block device.
    pub fn is_device(&self) -> bool {
        matches!(self.mode & S_IFMT, S_IFCHR | S_IFBLK)
    }

    pub fn is_executable(&self) -> bool {
        self.mode & 0o111 != 0
    }
}

/// What kind of node an entry is, including the walk's failure states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    /// Fifos, sockets and device nodes.
    Other,
    /// The node exists but its metadata could not be read.
    NotStatable,
    /// The node could not be read at all.
    Error,
}

impl EntryKind {
    pub fn from_file_type(ft: FileType) -> Self {
        if ft.is_dir() {
            EntryKind::Directory
        } else if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_file() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// One node in a sibling list.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Display name. For root arguments this is the argument as given.
    pub name: String,
    pub path: PathBuf,
    /// Depth in the walk; 0 for root arguments.
    pub level: usize,
    pub kind: EntryKind,
    pub stat: Option<Stat>,
    /// Symlink target, only read when the long format needs it.
    pub link_target: Option<PathBuf>,
    /// Error text for `Error` and `NotStatable` entries.
    pub error: Option<String>,
    /// Special-file bits from the directory entry, kept for name-only listings.
    file_type: Option<FileType>,
}

impl Entry {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, level: usize, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            level,
            kind,
            stat: None,
            link_target: None,
            error: None,
            file_type: None,
        }
    }

    pub fn with_stat(mut self, stat: Stat) -> Self {
        self.stat = Some(stat);
        self
    }

    pub fn from_metadata(name: String, path: PathBuf, level: usize, meta: &Metadata) -> Self {
        let mut entry = Self::new(name, path, level, EntryKind::from_file_type(meta.file_type()));
        entry.file_type = Some(meta.file_type());
        entry.with_stat(Stat::from_metadata(meta))
    }

    /// An entry whose kind is known from the directory listing but whose
    /// metadata was never requested.
    pub fn from_file_type(name: String, path: PathBuf, level: usize, ft: FileType) -> Self {
        let mut entry = Self::new(name, path, level, EntryKind::from_file_type(ft));
        entry.file_type = Some(ft);
        entry
    }

    pub fn not_statable(name: String, path: PathBuf, level: usize, err: &io::Error) -> Self {
        let mut entry = Self::new(name, path, level, EntryKind::NotStatable);
        entry.error = Some(describe_io_error(err));
        entry
    }

    pub fn error(name: String, path: PathBuf, level: usize, message: impl Into<String>) -> Self {
        let mut entry = Self::new(name, path, level, EntryKind::Error);
        entry.error = Some(message.into());
        entry
    }

    /// Stat `path` into an entry. With `follow`, symlinks are resolved, and
    /// a dangling link falls back to the link itself.
    pub fn probe(name: String, path: PathBuf, level: usize, follow: bool) -> Self {
        let meta = if follow {
            fs::metadata(&path).or_else(|_| fs::symlink_metadata(&path))
        } else {
            fs::symlink_metadata(&path)
        };
        match meta {
            Ok(meta) => Self::from_metadata(name, path, level, &meta),
            Err(e) => Self::not_statable(name, path, level, &e),
        }
    }

    /// Read the symlink target if this entry is a symlink.
    pub fn resolve_link_target(&mut self) {
        if self.kind == EntryKind::Symlink {
            self.link_target = fs::read_link(&self.path).ok();
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_root(&self) -> bool {
        self.level == 0
    }

    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('.')
    }

    pub fn is_error(&self) -> bool {
        self.kind == EntryKind::Error
    }

    /// No metadata could be fetched for this entry.
    pub fn is_not_statable(&self) -> bool {
        self.kind == EntryKind::NotStatable
    }

    /// Error or not-stat-able: never printed, always reported.
    pub fn is_problem(&self) -> bool {
        self.is_error() || self.is_not_statable()
    }

    pub fn name_len(&self) -> usize {
        self.name.chars().count()
    }

    pub fn is_socket(&self) -> bool {
        self.file_type.is_some_and(|ft| ft.is_socket())
    }

    pub fn is_fifo(&self) -> bool {
        self.file_type.is_some_and(|ft| ft.is_fifo())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_probe_regular_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "0123456789").unwrap();

        let entry = Entry::probe("a.txt".to_string(), path, 1, false);
        assert_eq!(entry.kind, EntryKind::File);
        assert_eq!(entry.stat.as_ref().map(|s| s.size), Some(10));
        assert!(!entry.is_problem());
    }

    #[test]
    fn test_probe_missing_path_is_not_statable() {
        let dir = TempDir::new().unwrap();
        let entry = Entry::probe("nope".to_string(), dir.path().join("nope"), 0, false);
        assert!(entry.is_not_statable());
        assert_eq!(entry.error.as_deref(), Some("No such file or directory"));
        assert!(entry.stat.is_none());
    }

    #[test]
    fn test_probe_dangling_symlink_with_follow() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink("missing-target", &link).unwrap();

        let followed = Entry::probe("dangling".to_string(), link.clone(), 0, true);
        assert_eq!(followed.kind, EntryKind::Symlink);

        let mut physical = Entry::probe("dangling".to_string(), link, 1, false);
        physical.resolve_link_target();
        assert_eq!(physical.link_target, Some(PathBuf::from("missing-target")));
    }

    #[test]
    fn test_hidden_and_root_predicates() {
        let hidden = Entry::new(".git", ".git", 1, EntryKind::Directory);
        assert!(hidden.is_hidden());
        assert!(!hidden.is_root());
        assert!(hidden.is_dir());

        let root = Entry::new("src", "src", 0, EntryKind::Directory);
        assert!(root.is_root());
        assert!(!root.is_hidden());
    }

    #[test]
    fn test_device_mode_detection() {
        let chr = Stat {
            mode: S_IFCHR | 0o666,
            ..Default::default()
        };
        assert!(chr.is_device());
        let file = Stat {
            mode: 0o100755,
            ..Default::default()
        };
        assert!(!file.is_device());
        assert!(file.is_executable());
    }
}
