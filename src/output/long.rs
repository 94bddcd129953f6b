//! Long format (`-l`)

use std::io::{self, Write};

use termcolor::WriteColor;

use crate::tree::Entry;

use super::Render;
use super::config::OutputConfig;
use super::select::{Annotation, DisplayDescriptor, FieldWidths};
use super::utils::{format_time, mode_string, write_name, write_prefix, write_total};

/// Size column width when device numbers share it.
const DEVICE_FIELD_WIDTH: usize = 8;

pub struct Long {
    config: OutputConfig,
    /// Reference point for the six-month date rule.
    now: i64,
}

impl Long {
    pub fn new(config: OutputConfig) -> Self {
        Self::with_now(config, chrono::Local::now().timestamp())
    }

    pub fn with_now(config: OutputConfig, now: i64) -> Self {
        Self { config, now }
    }

    fn render_line(
        &self,
        out: &mut dyn WriteColor,
        entry: &Entry,
        annotation: Option<&Annotation>,
        widths: &FieldWidths,
    ) -> io::Result<()> {
        let Some(stat) = entry.stat.as_ref() else {
            return Ok(());
        };
        write_prefix(out, entry, widths, &self.config)?;

        let (user, group) = annotation.map_or(("", ""), |a| (a.user.as_str(), a.group.as_str()));
        write!(
            out,
            "{} {:>nlink$} {:<user_w$}  {:<group_w$}  ",
            mode_string(stat.mode),
            stat.nlink,
            user,
            group,
            nlink = widths.nlink_width(),
            user_w = widths.max_user,
            group_w = widths.max_group,
        )?;

        if self.config.flags {
            let flags = annotation.and_then(|a| a.flags.as_deref()).unwrap_or("");
            write!(out, "{:<width$} ", flags, width = widths.max_flags)?;
        }

        if stat.is_device() {
            let (major, minor) = split_device(stat.rdev);
            write!(out, "{:>3}, {:>3} ", major, minor)?;
        } else {
            let mut width = widths.size_width();
            if widths.has_device {
                width = width.max(DEVICE_FIELD_WIDTH);
            }
            write!(out, "{:>width$} ", stat.size)?;
        }

        let time = self.config.time.of(stat);
        write!(out, "{} ", format_time(time, self.now, self.config.full_time))?;
        write_name(out, entry, &self.config)?;
        if let Some(target) = &entry.link_target {
            write!(out, " -> {}", target.display())?;
        }
        writeln!(out)
    }
}

impl Render for Long {
    fn render(&self, listing: &DisplayDescriptor, out: &mut dyn WriteColor) -> io::Result<()> {
        write_total(out, listing, &self.config)?;
        let widths = listing.stats();
        for (entry, annotation) in listing.items() {
            self.render_line(out, entry, annotation, &widths)?;
        }
        Ok(())
    }
}

fn split_device(rdev: u64) -> (u32, u32) {
    let dev = rdev as libc::dev_t;
    (libc::major(dev), libc::minor(dev))
}
