use anyhow::{Context, Result, anyhow, bail};
use civic_core::normalize::parse_timestamp;
use civic_core::oracle::{Expectations, load_and_validate};
use civic_core::output::{read_fragments, write_output};
use civic_core::pipeline::{self, ErrorPolicy};
use civic_core::{Assembler, SpiderConfig};
use clap::{Parser, Subcommand, ValueEnum};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "civic")]
#[command(about = "Normalize and validate scraped public-meeting listings", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble raw fragments into output.json
    Normalize {
        /// JSON array of raw fragments from the scraper
        #[arg(long)]
        input: PathBuf,

        #[arg(long, default_value = "output.json")]
        output: PathBuf,

        /// Spider config directory (default: built-in tulok_boed)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Reference time for status, e.g. "2025-01-01 00:00:00" (default: now)
        #[arg(long)]
        now: Option<String>,

        #[arg(long, value_enum, default_value_t = OnError::Abort)]
        on_error: OnError,
    },
    /// Check an output.json against the meeting invariants
    Validate {
        #[arg(long, default_value = "output.json")]
        input: PathBuf,

        /// Spider config directory (default: built-in tulok_boed)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Export canonical JSON Schemas to the ./schemas directory
    Schema {
        #[command(subcommand)]
        command: SchemaCommands,
    },
}

#[derive(Subcommand)]
enum SchemaCommands {
    /// Export JSON Schema files for canonical types
    Export {
        /// Output directory (default: ./schemas)
        #[arg(long, default_value = "schemas")]
        out_dir: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OnError {
    /// Stop at the first bad fragment and write nothing
    Abort,
    /// Log bad fragments and write the rest
    Skip,
}

impl From<OnError> for ErrorPolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => ErrorPolicy::Abort,
            OnError::Skip => ErrorPolicy::Skip,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "civic_core=info,civic=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            output,
            config,
            now,
            on_error,
        } => normalize(&input, &output, config.as_deref(), now.as_deref(), on_error.into()),
        Commands::Validate { input, config } => validate(&input, config.as_deref()),
        Commands::Schema { command } => match command {
            SchemaCommands::Export { out_dir } => schema_export(out_dir),
        },
    }
}

fn load_config(dir: Option<&Path>) -> Result<SpiderConfig> {
    match dir {
        Some(dir) => SpiderConfig::load_from_dir(dir),
        None => SpiderConfig::tulok_boed(),
    }
}

fn parse_now(raw: Option<&str>) -> Result<PrimitiveDateTime> {
    match raw {
        Some(raw) => parse_timestamp(raw, true)
            .map(|ts| ts.get())
            .ok_or_else(|| anyhow!("--now {raw:?} is not a recognizable date/time")),
        None => Ok(pipeline::reference_now()),
    }
}

fn normalize(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    now: Option<&str>,
    policy: ErrorPolicy,
) -> Result<()> {
    let config = load_config(config)?;
    let now = parse_now(now)?;
    let fragments = read_fragments(input)?;
    info!(spider = %config.name, fragments = fragments.len(), %policy, "normalizing");

    let assembler = Assembler::new(&config, now);
    let outcome = pipeline::run(&assembler, &fragments, policy).context("fragment rejected")?;
    write_output(output, &outcome.meetings)?;

    println!(
        "Wrote {} meeting(s) to {} ({} skipped)",
        outcome.meetings.len(),
        output.display(),
        outcome.skipped.len()
    );
    Ok(())
}

fn validate(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let report = load_and_validate(input, &Expectations::from(&config))?;
    println!("{}", report.summary());
    if !report.passed() {
        bail!(
            "{} failed validation with {} violation(s)",
            input.display(),
            report.violations.len()
        );
    }
    Ok(())
}

fn schema_export(out_dir: PathBuf) -> Result<()> {
    fs::create_dir_all(&out_dir)?;

    // Export Meeting schema
    let meeting_schema = schema_for!(civic_core::schema::Meeting);
    let meeting_json = serde_json::to_string_pretty(&meeting_schema)?;
    fs::write(out_dir.join("Meeting.schema.json"), meeting_json)?;

    // Export RawFragment schema
    let fragment_schema = schema_for!(civic_core::fragment::RawFragment);
    let fragment_json = serde_json::to_string_pretty(&fragment_schema)?;
    fs::write(out_dir.join("RawFragment.schema.json"), fragment_json)?;

    println!("Exported schemas to {}", out_dir.display());
    Ok(())
}
