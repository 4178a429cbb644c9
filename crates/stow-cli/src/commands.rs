use anyhow::Context;
use colored::Colorize;
use stow_core::{LoadOptions, Persistence, Storage, StowConfig};

use crate::cli::*;
use crate::dump::{self, DateStyle, DumpLine, Resolved};

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Dump(args) => cmd_dump(args, cli.format),
        Command::Header(args) => cmd_header(args, cli.format),
        Command::Get(args) => cmd_get(args, cli.format),
    }
}

fn load(file: &std::path::Path, config: StowConfig) -> anyhow::Result<Storage> {
    let mut root = Storage::new();
    Persistence::new(config)
        .load(&mut root, file, LoadOptions::default())
        .with_context(|| format!("loading {}", file.display()))?;
    Ok(root)
}

fn cmd_dump(args: DumpArgs, format: OutputFormat) -> anyhow::Result<()> {
    let config = StowConfig {
        max_depth: args.max_depth,
        ..StowConfig::default()
    };
    let root = load(&args.file, config)?;

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&dump::to_json(&root))?);
        return Ok(());
    }

    let dates = match (args.no_dates, args.utc) {
        (true, _) => DateStyle::Off,
        (false, true) => DateStyle::Utc,
        (false, false) => DateStyle::Local,
    };
    println!("{}", dump::header_line(&root).bold());
    let prefix = args.file.display().to_string();
    for line in dump::dump_lines(&root, &prefix, dates) {
        print_line(&line);
    }
    Ok(())
}

fn print_line(line: &DumpLine) {
    let annotation = line.annotation().unwrap_or_default();
    match line {
        DumpLine::Scalar { .. } => {
            println!("{} = {}{}", line.path().bold(), line.value(), annotation.dimmed())
        }
        DumpLine::Empty { .. } => println!("{} = {}", line.path().bold(), line.value().dimmed()),
    }
}

fn cmd_header(args: HeaderArgs, format: OutputFormat) -> anyhow::Result<()> {
    let header = Persistence::new(StowConfig::default())
        .load_header(&args.file)
        .with_context(|| format!("reading header of {}", args.file.display()))?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "header": header })),
        OutputFormat::Text => println!("{}", header),
    }
    Ok(())
}

fn cmd_get(args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let segments = dump::parse_path(&args.path)
        .with_context(|| format!("invalid path: {}", args.path))?;
    let root = load(&args.file, StowConfig::default())?;

    match dump::resolve(&root, &segments) {
        Some(Resolved::Scalar(value)) => match format {
            OutputFormat::Json => println!("{}", serde_json::Value::String(value.to_owned())),
            OutputFormat::Text => println!("{value}"),
        },
        Some(Resolved::Node(node)) => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&dump::to_json(node))?)
            }
            OutputFormat::Text => {
                for line in dump::dump_lines(node, &args.path, DateStyle::Off) {
                    print_line(&line);
                }
            }
        },
        None => anyhow::bail!("{} not found in {}", args.path.yellow(), args.file.display()),
    }
    Ok(())
}
