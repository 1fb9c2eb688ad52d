use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use countdown::config::CountdownConfig;
use countdown::models::{ExtraDefault, Unit};
use countdown::Countdown;

#[derive(Parser)]
#[command(name = "countdown")]
#[command(about = "Render time spans through countdown templates and parse them back")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct TemplateArgs {
    /// Template (overrides the configured one)
    #[arg(long, short)]
    template: Option<String>,

    /// Extra default as key=value (repeatable)
    #[arg(long = "extra", short = 'e', value_parser = parse_key_value)]
    extras: Vec<(String, String)>,

    /// Keep units whose value is zero
    #[arg(long)]
    keep_empty: bool,

    /// Do not trim surrounding whitespace
    #[arg(long)]
    no_strip: bool,

    /// Ceiling for every unit value
    #[arg(long)]
    max_value: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a time span
    Render {
        #[command(flatten)]
        template: TemplateArgs,

        #[arg(long, allow_hyphen_values = true)]
        microseconds: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        seconds: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        minutes: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        hours: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        days: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        weeks: Option<f64>,

        /// Start instant (RFC 3339)
        #[arg(long)]
        from: Option<String>,

        /// End instant (RFC 3339); defaults to now
        #[arg(long)]
        to: Option<String>,
    },

    /// Parse rendered text back into a time value
    Parse {
        #[command(flatten)]
        template: TemplateArgs,

        /// Text to parse
        text: String,
    },

    /// Show the normalized template and its flags
    Compile {
        #[command(flatten)]
        template: TemplateArgs,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn parse_instant(s: &str) -> Result<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(s).with_context(|| format!("Invalid RFC 3339 instant: {}", s))
}

fn build_countdown(config: &CountdownConfig, args: &TemplateArgs) -> Result<Countdown> {
    let mut config = config.clone();
    if let Some(template) = &args.template {
        config.template = template.clone();
    }
    if args.keep_empty {
        config.remove_empty = false;
    }
    if args.no_strip {
        config.strip = false;
    }
    if args.max_value.is_some() {
        config.max_value = args.max_value;
    }
    config.validate()?;

    let mut defaults = config.extra_defaults();
    for (key, value) in &args.extras {
        defaults.insert(key.clone(), ExtraDefault::literal(value.clone()));
    }

    Ok(Countdown::new(&config.template)?
        .with_options(config.render_options())
        .with_defaults(defaults))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    tracing::debug!("Starting countdown v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => CountdownConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => CountdownConfig::default(),
    };

    match cli.command {
        Commands::Render {
            template,
            microseconds,
            seconds,
            minutes,
            hours,
            days,
            weeks,
            from,
            to,
        } => {
            let countdown = build_countdown(&config, &template)?;

            let output = if let Some(from) = from {
                let start = parse_instant(&from)?;
                match to {
                    Some(to) => countdown.format_datetime(&start, &parse_instant(&to)?)?,
                    None => {
                        let now = chrono::Utc::now().with_timezone(start.offset());
                        countdown.format_datetime(&start, &now)?
                    }
                }
            } else if let Some(to) = to {
                countdown.format_until(&parse_instant(&to)?)?
            } else {
                let inputs = [
                    (microseconds, 1),
                    (seconds, Unit::Second.microseconds()),
                    (minutes, Unit::Minute.microseconds()),
                    (hours, Unit::Hour.microseconds()),
                    (days, Unit::Day.microseconds()),
                    (weeks, Unit::Week.microseconds()),
                ];
                let total: f64 = inputs
                    .iter()
                    .filter_map(|(value, scale)| value.map(|v| v * *scale as f64))
                    .sum();
                if inputs.iter().all(|(value, _)| value.is_none()) {
                    bail!("Provide a span (--seconds, --hours, ...) or --from/--to instants");
                }
                countdown.format_microseconds(total)?
            };

            println!("{}", output);
        }

        Commands::Parse { template, text } => {
            let countdown = build_countdown(&config, &template)?;
            let value = countdown.parse(&text)?;

            let report = serde_json::json!({
                "value": value,
                "total_microseconds": value.total_microseconds().to_string(),
                "total_seconds": value.total_seconds(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Compile { template } => {
            let countdown = build_countdown(&config, &template)?;
            let compiled = countdown.compiled();

            println!("Normalized: {}", compiled.normalized());
            for flag in compiled.flags() {
                let plurals: Vec<_> = flag.plurals().map(|p| p.symbol()).collect();
                let extras: Vec<_> = flag.extras().collect();
                println!(
                    "  {:<2} plurals={:?} extras={:?} fragments={}{}",
                    flag.key(),
                    plurals,
                    extras,
                    flag.fragments().len(),
                    if flag.is_locked() { " (locked)" } else { "" }
                );
            }
        }
    }

    Ok(())
}
