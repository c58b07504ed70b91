use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::ffi::CString;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use kprint_core::{prepare_format, scan, Mask, LEADER_HEADER, UNIT_HEADER};
use kprint_group::{ConsoleKind, GroupConfig};

mod demo;

#[derive(Parser, Debug)]
#[command(name = "kprint")]
#[command(about = "Inspect prepared templates and run a traced demo kernel")]
struct Cli {
    /// Log at debug level (otherwise KPRINT_LOG, default warn)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the reflowed template a print call would hand to the formatter
    Prepare(PrepareArgs),
    /// Run a tree reduction over a group, tracing every step
    Demo(DemoArgs),
}

#[derive(Args, Debug)]
struct PrepareArgs {
    /// Format template; `\n`, `\t` and `\\` escapes are expanded
    template: String,

    /// Indentation level (two spaces each)
    #[arg(long, short = 'l', default_value_t = 0)]
    level: u32,

    /// Leader-style template with no unit tag
    #[arg(long, conflicts_with = "header")]
    untagged: bool,

    /// Custom header for the first line
    #[arg(long)]
    header: Option<String>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    /// Units in the group (overrides config and KPRINT_GROUP_SIZE)
    #[arg(long, short = 'u')]
    units: Option<u32>,

    /// Units that trace their load step: 0b…, 0x… or decimal (overrides config and KPRINT_MASK)
    #[arg(long, short = 'm')]
    mask: Option<Mask>,

    /// One thread per unit instead of the emulated group
    #[arg(long)]
    threaded: bool,

    /// stdout or stderr
    #[arg(long)]
    console: Option<ConsoleKind>,

    /// JSON group config; KPRINT_* variables and flags take precedence
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("KPRINT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn run_prepare(args: PrepareArgs) -> Result<()> {
    let template = CString::new(unescape(&args.template)).context("template contains a NUL byte")?;
    let header = match (&args.header, args.untagged) {
        (Some(h), _) => CString::new(h.as_str()).context("header contains a NUL byte")?,
        (None, true) => LEADER_HEADER.to_owned(),
        (None, false) => UNIT_HEADER.to_owned(),
    };

    let s = scan(&template);
    let prepared = prepare_format(args.level, &header, &template)
        .with_context(|| format!("preparing {:?}", args.template))?;

    println!("level {}, header {:?}", args.level, header.to_string_lossy());
    println!(
        "scan: {} bytes, {} line breaks, trailing break: {}",
        s.len,
        s.line_breaks,
        if s.ends_with_break { "yes" } else { "no" }
    );
    println!(
        "prepared: {} bytes + NUL, {} lines",
        prepared.len(),
        prepared.line_count()
    );
    for line in String::from_utf8_lossy(prepared.as_bytes()).lines() {
        println!("  |{line}|");
    }
    Ok(())
}

fn resolve_config(args: &DemoArgs) -> Result<GroupConfig> {
    let base = match &args.config {
        Some(path) => GroupConfig::load(path)
            .with_context(|| format!("loading group config {}", path.display()))?,
        None => GroupConfig::default(),
    };
    let mut cfg = base.with_env();
    if let Some(n) = args.units {
        cfg.group_size = n.max(1);
    }
    if let Some(kind) = args.console {
        cfg.console = kind;
    }
    if let Some(mask) = args.mask {
        cfg.trace_mask = mask;
    }
    cfg.threaded |= args.threaded;
    Ok(cfg)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Prepare(args) => run_prepare(args),
        Command::Demo(args) => {
            let cfg = resolve_config(&args)?;
            demo::run(&cfg)
        }
    }
}
