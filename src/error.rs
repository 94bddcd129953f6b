//! Error taxonomy for listing runs

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LsError {
    /// The walk could not be started for the given roots.
    #[error("fts_open: {message}")]
    WalkOpen { message: String },

    /// A single node could not be read or stat-ed.
    #[error("{name}: {message}")]
    Node {
        name: String,
        path: PathBuf,
        message: String,
    },

    #[error("{name}: directory causes a cycle")]
    Cycle { name: String, path: PathBuf },

    /// The walk itself failed while advancing, independent of any one node.
    #[error("fts_read: {message}")]
    WalkRead { message: String },

    #[error("{context}: cannot allocate memory")]
    Allocation { context: String },

    #[error("error writing output: {0}")]
    Output(#[from] io::Error),
}

impl LsError {
    /// Whether the walk keeps going after this error.
    ///
    /// Node and cycle errors are reported and the walk continues. An
    /// allocation failure only abandons the directory being rendered.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Node { .. } | Self::Cycle { .. } | Self::Allocation { .. }
        )
    }
}

/// Render an io error the way `strerror` would, without the
/// `(os error N)` suffix std appends.
pub fn describe_io_error(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error ") {
        Some(pos) => text[..pos].to_string(),
        None => text,
    }
}
