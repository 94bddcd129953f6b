//! Comma-separated stream layout (`-m`)

use std::io::{self, Write};

use termcolor::WriteColor;

use super::Render;
use super::config::OutputConfig;
use super::select::DisplayDescriptor;
use super::utils::{entry_width, print_entry};

const SEPARATOR: &str = ", ";

pub struct Stream {
    config: OutputConfig,
}

impl Stream {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }
}

impl Render for Stream {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()> {
        let mut written = 0;
        let mut remaining = listing.count;
        for entry in listing.visible() {
            remaining -= 1;
            let separator = if remaining > 0 { SEPARATOR.len() } else { 0 };
            let width = entry_width(entry, listing, &self.config);
            if written > 0 && written + width + separator >= self.config.term_width {
                writeln!(out)?;
                written = 0;
            }
            written += print_entry(out, entry, listing, &self.config)?;
            if remaining > 0 {
                write!(out, "{}", SEPARATOR)?;
                written += SEPARATOR.len();
            }
        }
        if written > 0 {
            writeln!(out)?;
        }
        Ok(())
    }
}
