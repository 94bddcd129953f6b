//! Terminal width detection

use std::env;

/// Width used when nothing better is known.
pub const DEFAULT_WIDTH: usize = 80;

/// Width of the terminal standard output is attached to.
///
/// `COLUMNS` wins when it holds a positive number, then the terminal
/// device itself, then [`DEFAULT_WIDTH`]. Non-terminal output always gets
/// the default.
pub fn detect_width(is_terminal: bool) -> usize {
    if !is_terminal {
        return DEFAULT_WIDTH;
    }
    let columns = env::var("COLUMNS").ok();
    width_from(columns.as_deref(), || {
        terminal_size::terminal_size().map(|(width, _)| width.0 as usize)
    })
}

/// Resolve a width from a `COLUMNS` value and a terminal probe.
pub fn width_from(columns: Option<&str>, probe: impl FnOnce() -> Option<usize>) -> usize {
    columns
        .and_then(|c| c.trim().parse::<usize>().ok())
        .filter(|&w| w > 0)
        .or_else(|| probe().filter(|&w| w > 0))
        .unwrap_or(DEFAULT_WIDTH)
}
