//! CLI entry point for fls

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use termcolor::{BufferedStandardStream, ColorChoice};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use fls::terminal::detect_width;
use fls::tree::NameFilter;
use fls::{DisplayMode, ListingConfig, LsError, OutputConfig, SortKey, SymlinkMode, SystemIds, TimeField, Traversal};

/// Environment variable holding the log filter.
const LOG_ENV: &str = "FLS_LOG";

/// Color output mode
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and environment
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

/// Determine whether to use color output based on mode and environment.
fn should_use_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            // Respect NO_COLOR environment variable (https://no-color.org/)
            if std::env::var_os("NO_COLOR").is_some() {
                return false;
            }
            if std::env::var_os("FORCE_COLOR").is_some() {
                return true;
            }
            if std::env::var("TERM").map(|t| t == "dumb").unwrap_or(false) {
                return false;
            }
            io::stdout().is_terminal()
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "fls")]
#[command(about = "List directory contents")]
#[command(version)]
#[command(args_override_self = true)]
struct Args {
    /// Paths to list (default: the current directory)
    paths: Vec<PathBuf>,

    /// One entry per line
    #[arg(short = '1')]
    one_per_line: bool,

    /// Multi-column output, sorted down the columns
    #[arg(short = 'C')]
    columns: bool,

    /// Long format
    #[arg(short = 'l')]
    long: bool,

    /// Comma-separated stream output
    #[arg(short = 'm')]
    stream: bool,

    /// Multi-column output, sorted across the rows
    #[arg(short = 'x')]
    across: bool,

    /// Long format with numeric user and group ids
    #[arg(short = 'n')]
    numeric: bool,

    /// Use the status change time for sorting and display
    #[arg(short = 'c')]
    ctime: bool,

    /// Use the access time for sorting and display
    #[arg(short = 'u')]
    atime: bool,

    /// Append a type indicator to each name (/ * @ = |)
    #[arg(short = 'F')]
    classify: bool,

    /// Follow symbolic links during the walk
    #[arg(short = 'L')]
    dereference: bool,

    /// List subdirectories recursively
    #[arg(short = 'R')]
    recursive: bool,

    /// Include entries starting with `.`, plus `.` and `..`
    #[arg(short = 'a')]
    all: bool,

    /// Include entries starting with `.`
    #[arg(short = 'A')]
    almost_all: bool,

    /// List directories themselves, not their contents
    #[arg(short = 'd')]
    directory: bool,

    /// Do not sort
    #[arg(short = 'f')]
    unsorted: bool,

    /// Accepted for compatibility; no effect
    #[arg(short = 'g')]
    compat_g: bool,

    /// Print the inode number of each entry
    #[arg(short = 'i')]
    inode: bool,

    /// Count blocks in kilobytes
    #[arg(short = 'k')]
    kilobytes: bool,

    /// Show the file flags column in the long format
    #[arg(short = 'o')]
    flags: bool,

    /// Append / to directories
    #[arg(short = 'p')]
    slash: bool,

    /// Print non-printable characters in names as ?
    #[arg(short = 'q')]
    nonprint: bool,

    /// Reverse the sort order
    #[arg(short = 'r')]
    reverse: bool,

    /// Sort by size, smallest first
    #[arg(short = 'S')]
    size_sort: bool,

    /// Print the block count of each entry
    #[arg(short = 's')]
    blocks: bool,

    /// Show complete dates in the long format
    #[arg(short = 'T')]
    full_time: bool,

    /// Sort by time, newest first
    #[arg(short = 't')]
    time_sort: bool,

    /// Show whiteouts (accepted; there are none on this platform)
    #[arg(short = 'W')]
    whiteout: bool,

    /// Ignore entries matching a glob pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore", value_name = "PATTERN")]
    ignore: Vec<String>,

    /// Control color output: auto, always, never
    #[arg(long = "color", value_name = "WHEN", default_value = "auto")]
    color: ColorMode,

    /// Unit for block counts. Use suffixes: K, M, G (e.g., 4K)
    #[arg(long = "block-size", value_name = "SIZE", value_parser = parse_block_size)]
    block_size: Option<u64>,
}

/// Parse a file size string like "5M", "100K", "1G" into bytes.
/// Supports suffixes: K/KB (1024), M/MB (1024^2), G/GB (1024^3)
/// Without suffix, interprets as bytes.
fn parse_file_size(s: &str) -> Result<u64, String> {
    let s = s.trim().to_uppercase();
    let (num_str, multiplier) = if let Some(n) = s.strip_suffix("GB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('G') {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix('M') {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix('K') {
        (n, 1024)
    } else {
        (s.as_str(), 1)
    };

    let num: u64 = num_str
        .trim()
        .parse()
        .map_err(|_| format!("invalid number: {}", num_str))?;

    num.checked_mul(multiplier)
        .ok_or_else(|| format!("too large: {}", s))
}

fn parse_block_size(s: &str) -> Result<u64, String> {
    match parse_file_size(s)? {
        0 => Err("block size must be positive".to_string()),
        size => Ok(size),
    }
}

/// Of the flags in `ids` given on the command line, the one given last.
fn last_flag<'a>(matches: &ArgMatches, ids: &[&'a str]) -> Option<&'a str> {
    ids.iter()
        .filter(|id| matches.value_source(id) == Some(ValueSource::CommandLine))
        .filter_map(|id| matches.index_of(id).map(|index| (index, *id)))
        .max_by_key(|(index, _)| *index)
        .map(|(_, id)| id)
}

fn display_mode(matches: &ArgMatches, is_terminal: bool) -> DisplayMode {
    match last_flag(matches, &["one_per_line", "columns", "long", "stream", "across", "numeric"]) {
        Some("one_per_line") => DisplayMode::SingleColumn,
        Some("columns") => DisplayMode::Columns,
        Some("long" | "numeric") => DisplayMode::Long,
        Some("stream") => DisplayMode::Stream,
        Some("across") => DisplayMode::Across,
        _ if is_terminal => DisplayMode::Columns,
        _ => DisplayMode::SingleColumn,
    }
}

fn build_config(args: &Args, matches: &ArgMatches, is_terminal: bool) -> ListingConfig {
    let time = match last_flag(matches, &["ctime", "atime"]) {
        Some("ctime") => TimeField::Changed,
        Some("atime") => TimeField::Accessed,
        _ => TimeField::Modified,
    };

    let sort = if args.unsorted {
        SortKey::Unsorted
    } else {
        match last_flag(matches, &["size_sort", "time_sort"]) {
            Some("size_sort") => SortKey::Size,
            Some("time_sort") => SortKey::by_time(time),
            _ => SortKey::Name,
        }
    };

    let superuser = uzers::get_current_uid() == 0;

    let block_size = match last_flag(matches, &["kilobytes", "block_size"]) {
        Some("block_size") => args.block_size.unwrap_or(1024),
        _ => 1024,
    };

    let output = OutputConfig {
        use_color: should_use_color(args.color),
        term_width: detect_width(is_terminal),
        inode: args.inode,
        blocks: args.blocks,
        classify: args.classify,
        slash_dirs: args.slash,
        nonprint: args.nonprint || is_terminal,
        full_time: args.full_time,
        flags: args.flags,
        time,
        block_size,
    };

    ListingConfig {
        display: display_mode(matches, is_terminal),
        sort,
        reverse: args.reverse,
        show_hidden: args.all || args.almost_all || superuser,
        see_dot: args.all,
        recursive: args.recursive && !args.directory,
        list_dir: args.directory,
        numeric_only: last_flag(matches, &["long", "numeric"]) == Some("numeric"),
        symlinks: if args.dereference {
            SymlinkMode::Logical
        } else {
            SymlinkMode::Physical
        },
        compat_g: args.compat_g,
        whiteout: args.whiteout,
        roots: if args.paths.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            args.paths.clone()
        },
        ignore: NameFilter::new(args.ignore.as_slice()),
        output,
    }
}

fn color_choice(mode: ColorMode, use_color: bool) -> ColorChoice {
    match mode {
        ColorMode::Always => ColorChoice::Always,
        _ if use_color => ColorChoice::Auto,
        _ => ColorChoice::Never,
    }
}

fn run(config: &ListingConfig, choice: ColorChoice) -> Result<u8, LsError> {
    let ids = SystemIds::new();
    let mut out = BufferedStandardStream::stdout(choice);
    let mut err = io::stderr().lock();

    let status = Traversal::new(config, &ids).run(&mut out, &mut err);
    out.flush()?;
    Ok(status?.exit_code())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let matches = Args::command().get_matches();
    let args = match Args::from_arg_matches(&matches) {
        Ok(args) => args,
        Err(e) => e.exit(),
    };

    let is_terminal = io::stdout().is_terminal();
    let config = build_config(&args, &matches, is_terminal);
    debug!(?config, "parsed arguments");

    match run(&config, color_choice(args.color, config.output.use_color)) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("fls: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> (Args, ArgMatches) {
        let matches = Args::command().try_get_matches_from(argv).unwrap();
        let args = Args::from_arg_matches(&matches).unwrap();
        (args, matches)
    }

    fn config(argv: &[&str]) -> ListingConfig {
        let (args, matches) = parse(argv);
        build_config(&args, &matches, false)
    }

    #[test]
    fn test_last_display_flag_wins() {
        assert_eq!(config(&["fls", "-l", "-1"]).display, DisplayMode::SingleColumn);
        assert_eq!(config(&["fls", "-1", "-l"]).display, DisplayMode::Long);
        assert_eq!(config(&["fls", "-Cx"]).display, DisplayMode::Across);
        assert_eq!(config(&["fls", "-xm"]).display, DisplayMode::Stream);
    }

    #[test]
    fn test_default_mode_depends_on_terminal() {
        let (args, matches) = parse(&["fls"]);
        assert_eq!(build_config(&args, &matches, false).display, DisplayMode::SingleColumn);
        let tty = build_config(&args, &matches, true);
        assert_eq!(tty.display, DisplayMode::Columns);
        assert!(tty.output.nonprint);
    }

    #[test]
    fn test_numeric_cleared_by_later_long() {
        let numeric = config(&["fls", "-n"]);
        assert!(numeric.numeric_only);
        assert!(numeric.is_long());
        assert!(!config(&["fls", "-n", "-l"]).numeric_only);
        assert!(config(&["fls", "-l", "-n"]).numeric_only);
    }

    #[test]
    fn test_time_flags_override_each_other() {
        assert_eq!(config(&["fls", "-c", "-u"]).output.time, TimeField::Accessed);
        assert_eq!(config(&["fls", "-u", "-c"]).output.time, TimeField::Changed);
        assert_eq!(config(&["fls", "-tc"]).sort, SortKey::by_time(TimeField::Changed));
    }

    #[test]
    fn test_sort_selection() {
        assert_eq!(config(&["fls"]).sort, SortKey::Name);
        assert_eq!(config(&["fls", "-t", "-S"]).sort, SortKey::Size);
        assert_eq!(config(&["fls", "-S", "-t"]).sort, SortKey::Modified);
        assert_eq!(config(&["fls", "-S", "-f"]).sort, SortKey::Unsorted);
        assert!(config(&["fls", "-r"]).reverse);
    }

    #[test]
    fn test_directory_flag_disables_recursion() {
        let cfg = config(&["fls", "-R", "-d"]);
        assert!(cfg.list_dir);
        assert!(!cfg.recursive);
    }

    #[test]
    fn test_all_enables_dot_entries() {
        let cfg = config(&["fls", "-a"]);
        assert!(cfg.show_hidden);
        assert!(cfg.see_dot);
        assert!(!config(&["fls", "-A"]).see_dot);
    }

    #[test]
    fn test_roots_default_to_current_directory() {
        assert_eq!(config(&["fls"]).roots, [PathBuf::from(".")]);
        assert_eq!(config(&["fls", "x", "y"]).roots.len(), 2);
    }

    #[test]
    fn test_block_size_parsing() {
        assert_eq!(parse_block_size("4K"), Ok(4096));
        assert_eq!(parse_block_size("512"), Ok(512));
        assert!(parse_block_size("0").is_err());
        assert!(parse_block_size("lots").is_err());
        assert_eq!(config(&["fls", "--block-size", "1M"]).output.block_size, 1024 * 1024);
        assert_eq!(config(&["fls", "-k"]).output.block_size, 1024);
    }

    #[test]
    fn test_repeated_flags_accepted() {
        assert!(config(&["fls", "-l", "-l"]).is_long());
        assert!(config(&["fls", "-aa"]).see_dot);
    }

    #[test]
    fn test_ignore_patterns() {
        let cfg = config(&["fls", "-I", "*.o", "--ignore", "target"]);
        assert!(cfg.ignore.is_ignored("main.o"));
        assert!(cfg.ignore.is_ignored("target"));
        assert!(!cfg.ignore.is_ignored("main.c"));
    }
}
