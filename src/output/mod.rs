//! Listing formatters and display dispatch
//!
//! # Module Structure
//!
//! - `config` - Output configuration types
//! - `select` - Selection and aggregation over one sibling list
//! - `utils` - Shared helpers (names, indicators, mode strings, dates)
//! - `single` - One entry per line
//! - `columns` - Multi-column layouts, down and across
//! - `stream` - Comma-separated stream
//! - `long` - Long format

mod columns;
mod config;
mod long;
mod select;
mod single;
mod stream;
mod utils;

use std::io;

use termcolor::WriteColor;

use crate::config::ListingConfig;

pub use columns::{Columns, Fill};
pub use config::{DisplayMode, OutputConfig};
pub use long::Long;
pub use select::{Annotation, DisplayDescriptor, FieldWidths, NodeProblem, Selection, blocks_in_units, digits};
pub use single::SingleColumn;
pub use stream::Stream;
pub use utils::{display_name, format_time, mode_string, type_indicator};

/// A layout that prints one listing.
pub trait Render {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()>;
}

/// The renderer chosen for a run.
pub enum Renderer {
    Single(SingleColumn),
    Columns(Columns),
    Stream(Stream),
    Long(Long),
}

impl Render for Renderer {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()> {
        match self {
            Renderer::Single(r) => r.render(listing, out),
            Renderer::Columns(r) => r.render(listing, out),
            Renderer::Stream(r) => r.render(listing, out),
            Renderer::Long(r) => r.render(listing, out),
        }
    }
}

/// Pick the renderer for the configured display mode.
pub fn renderer_for(config: &ListingConfig) -> Renderer {
    let output = config.output.clone();
    match config.display {
        DisplayMode::SingleColumn => Renderer::Single(SingleColumn::new(output)),
        DisplayMode::Columns => Renderer::Columns(Columns::new(output, Fill::Down)),
        DisplayMode::Across => Renderer::Columns(Columns::new(output, Fill::Across)),
        DisplayMode::Stream => Renderer::Stream(Stream::new(output)),
        DisplayMode::Long => Renderer::Long(Long::new(output)),
    }
}
