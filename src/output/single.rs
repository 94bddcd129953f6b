//! One entry per line

use std::io::{self, Write};

use termcolor::WriteColor;

use super::Render;
use super::config::OutputConfig;
use super::select::DisplayDescriptor;
use super::utils::{print_entry, write_total};

/// Renders `-1` listings.
pub struct SingleColumn {
    config: OutputConfig,
}

impl SingleColumn {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }
}

impl Render for SingleColumn {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()> {
        if self.config.blocks {
            write_total(out, listing, &self.config)?;
        }
        for entry in listing.visible() {
            print_entry(out, entry, listing, &self.config)?;
            writeln!(out)?;
        }
        Ok(())
    }
}
