//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{eyre, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use cairn_core::pipeline::{CollectConfig, CollectResult, ProgressReporter};
use cairn_core::PipelineConfig;
use cairn_shared::{
    init_config, load_config, validate_config, AppConfig, ContentType, FetchConfig,
};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// cairn — collect and normalize mountaineering content.
#[derive(Parser)]
#[command(
    name = "cairn",
    version,
    about = "Collect mountaineering content and normalize it into a flat, retrieval-ready corpus.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Fetch content from the API and write a normalized corpus.
    Collect {
        /// Output directory (defaults to the configured output dir).
        #[arg(short, long)]
        out: Option<String>,

        /// Content types to collect, comma-separated. Defaults to all.
        #[arg(short, long)]
        types: Option<String>,

        /// Maximum records per content type (overrides config).
        #[arg(short, long)]
        max: Option<usize>,

        /// Bounding box "min_lon,min_lat,max_lon,max_lat" (overrides config).
        #[arg(short, long)]
        bbox: Option<String>,
    },

    /// Normalize an existing raw snapshot file without fetching.
    Normalize {
        /// Raw snapshot file (a JSON array of API documents).
        input: PathBuf,

        /// Content type of the snapshot.
        #[arg(short = 't', long = "type")]
        content_type: String,

        /// Output directory (defaults to the configured output dir).
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Analyze a normalized corpus and print a completeness report.
    Report {
        /// A normalized .jsonl file, or a directory containing them.
        input: PathBuf,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = match cli.verbose {
        0 => "cairn=info",
        1 => "cairn=debug",
        _ => "cairn=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Collect {
            out,
            types,
            max,
            bbox,
        } => cmd_collect(out.as_deref(), types.as_deref(), max, bbox.as_deref()).await,
        Command::Normalize {
            input,
            content_type,
            out,
        } => cmd_normalize(&input, &content_type, out.as_deref()),
        Command::Report { input } => cmd_report(&input),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(),
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_collect(
    out: Option<&str>,
    types: Option<&str>,
    max: Option<usize>,
    bbox: Option<&str>,
) -> Result<()> {
    let mut config = load_config()?;

    // CLI flags override config file values.
    if let Some(max) = max {
        config.defaults.max_items_per_category = max;
    }
    if let Some(bbox) = bbox {
        config.defaults.bbox = Some(bbox.to_string());
    }
    validate_config(&config)?;

    let content_types = parse_types(types)?;
    let output_root = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let collect_config = CollectConfig {
        output_root,
        content_types,
        fetch: FetchConfig::try_from(&config)?,
        pipeline: PipelineConfig::from_app_config(&config),
    };

    info!(
        types = collect_config.content_types.len(),
        max_items = collect_config.fetch.max_items_per_category,
        out = %collect_config.output_root.display(),
        "starting collection"
    );

    let reporter = CliProgress::new();
    let result = cairn_core::collect_corpus(&collect_config, &reporter).await?;

    println!();
    println!("  Collection complete!");
    println!("  Records: {}", result.total_records);
    for (tag, count) in &result.by_type {
        println!("    {tag:<16} {count}");
    }
    println!("  Path:    {}", result.output_path.display());
    println!("  Time:    {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

fn cmd_normalize(input: &Path, content_type: &str, out: Option<&str>) -> Result<()> {
    let config = load_config()?;

    let content_type = ContentType::parse(content_type)
        .ok_or_else(|| eyre!("unknown content type '{content_type}'"))?;
    let output_root = out
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_dir));

    let (path, count) = cairn_core::normalize_snapshot(
        input,
        content_type,
        &output_root,
        &PipelineConfig::from_app_config(&config),
    )?;

    println!("Normalized {count} records to {}", path.display());
    Ok(())
}

fn cmd_report(input: &Path) -> Result<()> {
    let config = load_config()?;
    let report = cairn_core::report_corpus(input, &PipelineConfig::from_app_config(&config))?;

    println!();
    println!("  Corpus report ({} records)", report.stats.total_records);
    for (tag, count) in &report.stats.by_type {
        println!("    {tag:<16} {count}");
    }
    println!(
        "  Multilingual:     {}",
        report.stats.multilingual_records
    );
    println!(
        "  With coordinates: {}",
        report.stats.records_with_coordinates
    );
    println!();
    println!("  {:<32} {:>8} {:>8} {:>7}  tier", "field", "present", "defined", "ratio");
    for (field, stats) in &report.completeness.fields {
        println!(
            "  {:<32} {:>8} {:>8} {:>6.1}%  {}",
            field,
            stats.present,
            stats.defined,
            stats.ratio * 100.0,
            stats.tier.as_str()
        );
    }
    println!();

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

/// Parse a comma-separated content-type list, defaulting to all types.
fn parse_types(types: Option<&str>) -> Result<Vec<ContentType>> {
    match types {
        None => Ok(ContentType::ALL.to_vec()),
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|tag| {
                ContentType::parse(tag).ok_or_else(|| eyre!("unknown content type '{tag}'"))
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn documents_fetched(&self, content_type: &str, current: usize, total: Option<u64>) {
        let message = match total {
            Some(total) => format!("Fetching {content_type}s [{current}/{total}]"),
            None => format!("Fetching {content_type}s [{current}]"),
        };
        self.spinner.set_message(message);
    }

    fn done(&self, _result: &CollectResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_types_defaults_to_all() {
        let types = parse_types(None).unwrap();
        assert_eq!(types.len(), 6);
    }

    #[test]
    fn parse_types_accepts_plural_tags() {
        let types = parse_types(Some("routes, huts")).unwrap();
        assert_eq!(types, vec![ContentType::Route, ContentType::Hut]);
    }

    #[test]
    fn parse_types_rejects_unknown() {
        assert!(parse_types(Some("routes,outings")).is_err());
    }
}
