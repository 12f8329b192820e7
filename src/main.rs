use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Local, SecondsFormat};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

use revstamp::config::{self, Config};
use revstamp::format::TemplateResolver;
use revstamp::scheme::SchemeSpec;
use revstamp::ui::{self, ConsoleLogger, Logger};
use revstamp::vcs::ProviderSelector;

#[derive(Parser)]
#[command(
    name = "revstamp",
    version,
    about = "Derive build version strings from Git or Subversion working copies"
)]
struct Args {
    #[arg(short = 'C', long = "dir", global = true, default_value = ".", help = "Working directory to inspect")]
    dir: PathBuf,

    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<String>,

    #[arg(long, global = true, help = "Require this version control system (git, svn)")]
    vcs: Option<String>,

    #[arg(long, global = true, help = "Only consider tags matching this glob")]
    tag_match: Option<String>,

    #[arg(long, global = true, help = "Build configuration label for {bconf}")]
    build_config: Option<String>,

    #[arg(long, global = true, help = "Build time as RFC 3339, defaults to now")]
    build_time: Option<String>,

    #[arg(long, global = true, help = "Strip a leading 'v' from {tag}")]
    remove_tag_v: bool,

    #[arg(short, long, global = true, help = "Show VCS commands and their output")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full version (default)
    Resolve {
        #[arg(short, long, help = "Template overriding the configured one")]
        format: Option<String>,
    },
    /// Print the dotted numeric version
    Short {
        #[arg(short, long, help = "Template overriding the configured one")]
        format: Option<String>,
    },
    /// Print the copyright text
    Copyright {
        #[arg(short, long, help = "Template overriding the configured one")]
        format: Option<String>,
    },
    /// Print the collected revision data
    Info,
    /// Convert an encoded time back to UTC
    Decode {
        #[arg(help = "Time placeholder the value was produced with, e.g. {c:b28-20m:2020}")]
        token: String,
        value: String,
    },
}

fn main() {
    let args = Args::parse();
    let logger = ConsoleLogger::new(args.verbose);

    if let Err(e) = run(args, &logger) {
        logger.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args, logger: &dyn Logger) -> Result<()> {
    let command = args.command.unwrap_or(Command::Resolve { format: None });

    if let Command::Decode { token, value } = &command {
        let time = SchemeSpec::parse(token)?.decode(value)?;
        println!("{}", time.to_rfc3339_opts(SecondsFormat::Secs, true));
        return Ok(());
    }

    let mut config = config::load_config(args.config.as_deref(), &args.dir)
        .context("Failed to load configuration")?;
    apply_overrides(&mut config, &args.vcs, &args.tag_match, &args.build_config, args.remove_tag_v);
    config.validate()?;

    let build_time = build_time(args.build_time.as_deref())?;

    let selector = ProviderSelector::with_defaults(config.provider_options());
    let snapshot = selector.resolve(
        &args.dir,
        config.required_vcs(),
        &config.revision.tag_match,
        build_time,
        logger,
    )?;

    let options = config.resolve_options(build_time, machine_name());
    let resolver = TemplateResolver::new(&snapshot, &options, logger);

    let output = match command {
        Command::Resolve { format } => {
            resolver.resolve(format.as_deref().unwrap_or(&config.format.version))?
        }
        Command::Short { format } => {
            resolver.resolve_short(format.as_deref().unwrap_or(config.format.short_template()))?
        }
        Command::Copyright { format } => {
            resolver.resolve(format.as_deref().unwrap_or(&config.format.copyright))?
        }
        Command::Info => ui::format_snapshot(&snapshot),
        Command::Decode { .. } => unreachable!("handled before collecting"),
    };

    println!("{}", output);
    Ok(())
}

fn apply_overrides(
    config: &mut Config,
    vcs: &Option<String>,
    tag_match: &Option<String>,
    build_config: &Option<String>,
    remove_tag_v: bool,
) {
    if let Some(vcs) = vcs {
        config.revision.vcs = Some(vcs.clone());
    }
    if let Some(tag_match) = tag_match {
        config.revision.tag_match = tag_match.clone();
    }
    if let Some(build_config) = build_config {
        config.format.build_config = build_config.clone();
    }
    if remove_tag_v {
        config.format.remove_tag_v = true;
    }
}

/// Build time of this invocation, read once
fn build_time(value: Option<&str>) -> Result<DateTime<FixedOffset>> {
    match value {
        Some(text) => DateTime::parse_from_rfc3339(text)
            .with_context(|| format!("Invalid --build-time '{}', expected RFC 3339", text)),
        None => Ok(Local::now().fixed_offset()),
    }
}

fn machine_name() -> String {
    ["COMPUTERNAME", "HOSTNAME"]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .or_else(|| {
            fs::read_to_string("/etc/hostname")
                .ok()
                .map(|value| value.trim().to_string())
        })
        .unwrap_or_default()
}
