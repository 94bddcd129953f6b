//! Entry ordering: field comparators and the master comparator

use std::cmp::Ordering;

use super::entry::{Entry, FileTime, Stat};

/// Which timestamp long listings show and time sorts use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeField {
    #[default]
    Modified,
    Accessed,
    /// Status change (ctime).
    Changed,
}

impl TimeField {
    pub fn of(self, stat: &Stat) -> FileTime {
        match self {
            TimeField::Modified => stat.mtime,
            TimeField::Accessed => stat.atime,
            TimeField::Changed => stat.ctime,
        }
    }
}

/// The field entries are sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    /// Directory order as read.
    Unsorted,
    #[default]
    Name,
    Size,
    Modified,
    Accessed,
    Changed,
}

impl SortKey {
    pub fn by_time(field: TimeField) -> Self {
        match field {
            TimeField::Modified => SortKey::Modified,
            TimeField::Accessed => SortKey::Accessed,
            TimeField::Changed => SortKey::Changed,
        }
    }

    pub fn needs_stats(self) -> bool {
        !matches!(self, SortKey::Unsorted | SortKey::Name)
    }
}

/// Byte-wise name comparison; the tie-break for every other field.
pub fn by_name(a: &Entry, b: &Entry) -> Ordering {
    a.name.as_bytes().cmp(b.name.as_bytes())
}

/// Smallest first.
pub fn by_size(a: &Entry, b: &Entry) -> Ordering {
    size_of(a).cmp(&size_of(b)).then_with(|| by_name(a, b))
}

/// Newest first.
pub fn by_time(a: &Entry, b: &Entry, field: TimeField) -> Ordering {
    time_of(b, field)
        .cmp(&time_of(a, field))
        .then_with(|| by_name(a, b))
}

fn size_of(entry: &Entry) -> u64 {
    entry.stat.as_ref().map_or(0, |s| s.size)
}

fn time_of(entry: &Entry, field: TimeField) -> FileTime {
    entry.stat.as_ref().map(|s| field.of(s)).unwrap_or_default()
}

/// A single-field comparator with its reversed mirror.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldComparator {
    pub key: SortKey,
    pub reverse: bool,
}

impl FieldComparator {
    pub fn new(key: SortKey, reverse: bool) -> Self {
        Self { key, reverse }
    }

    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        let ordering = match self.key {
            SortKey::Unsorted => Ordering::Equal,
            SortKey::Name => by_name(a, b),
            SortKey::Size => by_size(a, b),
            SortKey::Modified => by_time(a, b, TimeField::Modified),
            SortKey::Accessed => by_time(a, b, TimeField::Accessed),
            SortKey::Changed => by_time(a, b, TimeField::Changed),
        };
        if self.reverse {
            ordering.reverse()
        } else {
            ordering
        }
    }
}

/// The master comparator.
///
/// Layers error passthrough, not-stat-able demotion and root-level
/// directory grouping over the active field comparator. Reversal only
/// affects the field comparator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderingPolicy {
    field: FieldComparator,
    group_root_dirs: bool,
}

impl OrderingPolicy {
    /// `list_dir` disables root-level grouping: with `-d` directories are
    /// listed in place among the other arguments.
    pub fn new(field: FieldComparator, list_dir: bool) -> Self {
        Self {
            field,
            group_root_dirs: !list_dir,
        }
    }

    pub fn field(&self) -> FieldComparator {
        self.field
    }

    pub fn is_unsorted(&self) -> bool {
        self.field.key == SortKey::Unsorted
    }

    pub fn compare(&self, a: &Entry, b: &Entry) -> Ordering {
        if self.is_unsorted() || a.is_error() || b.is_error() {
            return Ordering::Equal;
        }

        match (a.is_not_statable(), b.is_not_statable()) {
            (true, true) => return by_name(a, b),
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        if self.group_root_dirs && a.kind != b.kind && a.is_root() && b.is_root() {
            if a.is_dir() {
                return Ordering::Less;
            }
            if b.is_dir() {
                return Ordering::Greater;
            }
        }

        self.field.compare(a, b)
    }

    /// Stable sort that leaves `Error` entries at their original indices.
    ///
    /// Error passthrough makes the comparator non-transitive, so error
    /// entries are kept out of the sort altogether and the remaining
    /// entries are sorted into the slots around them.
    pub fn sort(&self, entries: &mut Vec<Entry>) {
        if self.is_unsorted() {
            return;
        }

        let errors: Vec<bool> = entries.iter().map(Entry::is_error).collect();
        if !errors.contains(&true) {
            entries.sort_by(|a, b| self.compare(a, b));
            return;
        }

        let mut order: Vec<usize> = (0..entries.len()).filter(|&i| !errors[i]).collect();
        order.sort_by(|&i, &j| self.compare(&entries[i], &entries[j]));

        let mut sorted = order.into_iter();
        let sources: Vec<usize> = (0..errors.len())
            .map(|slot| {
                if errors[slot] {
                    slot
                } else {
                    sorted.next().unwrap_or(slot)
                }
            })
            .collect();

        let mut taken: Vec<Option<Entry>> = std::mem::take(entries).into_iter().map(Some).collect();
        *entries = sources
            .into_iter()
            .filter_map(|source| taken[source].take())
            .collect();
    }
}
