//! Directory walking and ordering
//!
//! - `TreeWalker`: fts-style sequencing over `walkdir`
//! - `OrderingPolicy`: the comparator every sibling list is sorted with
//! - `Traversal`: the controller that turns walk events into listings

mod config;
mod entry;
mod filter;
mod order;
mod traversal;
mod walker;

// Re-export public types
pub use config::{SymlinkMode, WalkOptions};
pub use entry::{Entry, EntryKind, FileTime, Stat};
pub use filter::NameFilter;
pub use order::{FieldComparator, OrderingPolicy, SortKey, TimeField, by_name, by_size, by_time};
pub use traversal::{RunStatus, Traversal};
pub use walker::{TreeWalker, WalkEvent};
