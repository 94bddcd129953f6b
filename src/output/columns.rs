//! Multi-column layouts
//!
//! Both layouts share one geometry: every cell is as wide as the widest
//! entry rounded up to a tab stop, and as many cells as fit the terminal
//! make a row. `Columns` fills top to bottom, `Across` left to right.

use std::io::{self, Write};

use termcolor::WriteColor;

use super::Render;
use super::config::OutputConfig;
use super::select::DisplayDescriptor;
use super::single::SingleColumn;
use super::utils::{column_width, pad, print_entry, write_total};

/// Order in which cells are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Down,
    Across,
}

/// Renders `-C` and `-x` listings.
pub struct Columns {
    config: OutputConfig,
    fill: Fill,
}

impl Columns {
    pub fn new(config: OutputConfig, fill: Fill) -> Self {
        Self { config, fill }
    }

    fn render_down(
        &self,
        listing: &DisplayDescriptor,
        out: &mut dyn WriteColor,
        width: usize,
        num_cols: usize,
    ) -> io::Result<()> {
        let entries: Vec<_> = listing.visible().collect();
        let num_rows = entries.len().div_ceil(num_cols);
        for row in 0..num_rows {
            let mut written = 0;
            let mut index = row;
            let mut col = 0;
            while index < entries.len() {
                if col > 0 {
                    pad(out, written, col * width)?;
                    written = col * width;
                }
                written += print_entry(out, entries[index], listing, &self.config)?;
                index += num_rows;
                col += 1;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    fn render_across(
        &self,
        listing: &DisplayDescriptor,
        out: &mut dyn WriteColor,
        width: usize,
        num_cols: usize,
    ) -> io::Result<()> {
        let mut written = 0;
        let mut col = 0;
        for entry in listing.visible() {
            if col == num_cols {
                writeln!(out)?;
                written = 0;
                col = 0;
            }
            if col > 0 {
                pad(out, written, col * width)?;
                written = col * width;
            }
            written += print_entry(out, entry, listing, &self.config)?;
            col += 1;
        }
        writeln!(out)
    }
}

impl Render for Columns {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()> {
        let width = column_width(listing, &self.config);
        if self.config.term_width < 2 * width {
            return SingleColumn::new(self.config.clone()).render(listing, out);
        }
        let num_cols = (self.config.term_width / width).max(1);

        if self.config.blocks {
            write_total(out, listing, &self.config)?;
        }
        match self.fill {
            Fill::Down => self.render_down(listing, out, width, num_cols),
            Fill::Across => self.render_across(listing, out, width, num_cols),
        }
    }
}
