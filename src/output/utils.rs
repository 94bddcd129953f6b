//! Shared helpers for the listing renderers

use std::borrow::Cow;
use std::io::{self, Write};

use chrono::{DateTime, Local, TimeZone};
use termcolor::{Color, ColorSpec, WriteColor};

use crate::tree::{Entry, EntryKind, FileTime, Stat};

use super::config::OutputConfig;
use super::select::{DisplayDescriptor, FieldWidths, blocks_in_units};

/// Column alignment unit for the multi-column layouts.
pub const TAB_WIDTH: usize = 8;

/// Dates older or newer than this are shown with the year.
const SIX_MONTHS: i64 = 182 * 24 * 60 * 60;

/// Name as printed: with `nonprint`, control characters become `?`.
pub fn display_name(name: &str, nonprint: bool) -> Cow<'_, str> {
    if nonprint && name.chars().any(char::is_control) {
        Cow::Owned(
            name.chars()
                .map(|c| if c.is_control() { '?' } else { c })
                .collect(),
        )
    } else {
        Cow::Borrowed(name)
    }
}

/// Trailing type character for `-F` or `-p`, if the entry gets one.
pub fn type_indicator(entry: &Entry, config: &OutputConfig) -> Option<char> {
    if entry.is_dir() {
        return config.has_indicator().then_some('/');
    }
    if !config.classify {
        return None;
    }
    match entry.kind {
        EntryKind::Symlink => Some('@'),
        _ if entry.is_socket() => Some('='),
        _ if entry.is_fifo() => Some('|'),
        EntryKind::File if entry.stat.as_ref().is_some_and(Stat::is_executable) => Some('*'),
        _ => None,
    }
}

/// Colour for an entry's name, if it gets one.
pub fn name_color(entry: &Entry) -> Option<ColorSpec> {
    let mut spec = ColorSpec::new();
    match entry.kind {
        EntryKind::Directory => {
            spec.set_fg(Some(Color::Blue)).set_bold(true);
        }
        EntryKind::Symlink => {
            spec.set_fg(Some(Color::Cyan));
        }
        EntryKind::File if entry.stat.as_ref().is_some_and(Stat::is_executable) => {
            spec.set_fg(Some(Color::Green));
        }
        _ => return None,
    }
    Some(spec)
}

/// Write the name and its indicator. Returns the number of characters written.
pub fn write_name(out: &mut dyn WriteColor, entry: &Entry, config: &OutputConfig) -> io::Result<usize> {
    let name = display_name(&entry.name, config.nonprint);
    let color = config.use_color.then(|| name_color(entry)).flatten();
    match color {
        Some(spec) => {
            out.set_color(&spec)?;
            write!(out, "{}", name)?;
            out.reset()?;
        }
        None => write!(out, "{}", name)?,
    }
    let mut written = name.chars().count();
    if let Some(indicator) = type_indicator(entry, config) {
        write!(out, "{}", indicator)?;
        written += 1;
    }
    Ok(written)
}

/// Write the `-i` and `-s` columns. Returns the number of characters written.
pub fn write_prefix(
    out: &mut dyn WriteColor,
    entry: &Entry,
    widths: &FieldWidths,
    config: &OutputConfig,
) -> io::Result<usize> {
    let Some(stat) = entry.stat.as_ref() else {
        return Ok(0);
    };
    let mut written = 0;
    if config.inode {
        let width = widths.inode_width();
        write!(out, "{:>width$} ", stat.ino)?;
        written += width + 1;
    }
    if config.blocks {
        let width = widths.block_width();
        write!(out, "{:>width$} ", blocks_in_units(stat.blocks, config.block_size))?;
        written += width + 1;
    }
    Ok(written)
}

/// Prefix plus name plus indicator, as the short layouts print one entry.
pub fn print_entry(
    out: &mut dyn WriteColor,
    entry: &Entry,
    listing: &DisplayDescriptor,
    config: &OutputConfig,
) -> io::Result<usize> {
    let widths = listing.stats();
    let prefix = write_prefix(out, entry, &widths, config)?;
    Ok(prefix + write_name(out, entry, config)?)
}

/// Characters [`print_entry`] writes for `entry`.
pub fn entry_width(entry: &Entry, listing: &DisplayDescriptor, config: &OutputConfig) -> usize {
    let mut width = entry.name_len() + usize::from(type_indicator(entry, config).is_some());
    if entry.stat.is_some() {
        let widths = listing.stats();
        if config.inode {
            width += widths.inode_width() + 1;
        }
        if config.blocks {
            width += widths.block_width() + 1;
        }
    }
    width
}

/// Width of one cell in the multi-column layouts, rounded up to a tab stop.
pub fn column_width(listing: &DisplayDescriptor, config: &OutputConfig) -> usize {
    let widths = listing.stats();
    let mut width = listing.max_name_len;
    if config.inode {
        width += widths.inode_width() + 1;
    }
    if config.blocks {
        width += widths.block_width() + 1;
    }
    if config.has_indicator() {
        width += 1;
    }
    (width + TAB_WIDTH) & !(TAB_WIDTH - 1)
}

/// Pad with spaces from `from` to `to`.
pub fn pad(out: &mut dyn WriteColor, from: usize, to: usize) -> io::Result<()> {
    if to > from {
        write!(out, "{:width$}", "", width = to - from)?;
    }
    Ok(())
}

/// Print the `total` line for a directory's contents.
pub fn write_total(
    out: &mut dyn WriteColor,
    listing: &DisplayDescriptor,
    config: &OutputConfig,
) -> io::Result<()> {
    if listing.root {
        return Ok(());
    }
    writeln!(out, "total {}", listing.stats().total_in_units(config.block_size))
}

/// `ls -l` permission string, with the trailing alternate-access column.
pub fn mode_string(mode: u32) -> String {
    let kind = match mode & 0o170000 {
        0o040000 => 'd',
        0o120000 => 'l',
        0o020000 => 'c',
        0o060000 => 'b',
        0o010000 => 'p',
        0o140000 => 's',
        _ => '-',
    };

    let triplet = |read: u32, write: u32, exec: u32, special: u32, set: char| {
        let r = if mode & read != 0 { 'r' } else { '-' };
        let w = if mode & write != 0 { 'w' } else { '-' };
        let x = match (mode & exec != 0, mode & special != 0) {
            (true, true) => set,
            (false, true) => set.to_ascii_uppercase(),
            (true, false) => 'x',
            (false, false) => '-',
        };
        [r, w, x]
    };

    let mut s = String::with_capacity(11);
    s.push(kind);
    s.extend(triplet(0o400, 0o200, 0o100, 0o4000, 's'));
    s.extend(triplet(0o040, 0o020, 0o010, 0o2000, 's'));
    s.extend(triplet(0o004, 0o002, 0o001, 0o1000, 't'));
    s.push(' ');
    s
}

/// Long-format date for `time`, relative to `now` (seconds since the epoch).
pub fn format_time(time: FileTime, now: i64, full: bool) -> String {
    let Some(stamp) = local_time(time) else {
        return format!("{:>12}", "-");
    };
    let format = if full {
        "%b %e %H:%M:%S %Y"
    } else if time.secs + SIX_MONTHS > now && time.secs < now + SIX_MONTHS {
        "%b %e %H:%M"
    } else {
        "%b %e  %Y"
    };
    stamp.format(format).to_string()
}

fn local_time(time: FileTime) -> Option<DateTime<Local>> {
    let nanos = u32::try_from(time.nanos).unwrap_or(0);
    Local.timestamp_opt(time.secs, nanos).earliest()
}
