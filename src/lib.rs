//! fls - list directory contents over an fts-style walk

pub mod config;
pub mod error;
pub mod ids;
pub mod output;
pub mod terminal;
pub mod tree;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::ListingConfig;
pub use error::LsError;
pub use ids::{IdLookup, NumericIds, SystemIds};
pub use output::{DisplayDescriptor, DisplayMode, OutputConfig, Render, Renderer, renderer_for};
pub use tree::{Entry, OrderingPolicy, RunStatus, SortKey, SymlinkMode, TimeField, Traversal, TreeWalker};
