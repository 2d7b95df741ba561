//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use controlkb_core::context::build_context;
use controlkb_core::knowledge_base::KnowledgeBase;
use controlkb_core::pipeline::{BuildResult, ProgressReporter};
use controlkb_results::ResultStore;
use controlkb_shared::{AppConfig, BuildConfig, init_config, load_config};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// controlkb: a code-and-results knowledge base for security controls.
#[derive(Parser)]
#[command(
    name = "controlkb",
    version,
    about = "Build and query a knowledge base of security control modules and their query results.",
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
    /// Analyze every control module and rewrite the knowledge base.
    Build {
        /// Directory holding the control modules.
        #[arg(long)]
        controls_dir: Option<PathBuf>,

        /// Root that dotted import paths are resolved against.
        #[arg(long)]
        source_root: Option<PathBuf>,

        /// Title → category JSON table.
        #[arg(long)]
        categories: Option<PathBuf>,

        /// Knowledge base output file.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// List controls grouped by category.
    List {
        /// Knowledge base file.
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Print summaries as JSON instead of a grouped listing.
        #[arg(long)]
        json: bool,
    },

    /// Print one control record as JSON.
    Show {
        /// Exact control title.
        title: String,

        /// Knowledge base file.
        #[arg(long)]
        kb: Option<PathBuf>,
    },

    /// Print one request result with normalized paths.
    Request {
        /// Request key.
        key: String,

        /// Keyed request-result collection.
        #[arg(long)]
        results: Option<PathBuf>,
    },

    /// Print a control together with the results it reads.
    Context {
        /// Exact control title.
        title: String,

        /// Knowledge base file.
        #[arg(long)]
        kb: Option<PathBuf>,

        /// Keyed request-result collection.
        #[arg(long)]
        results: Option<PathBuf>,
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
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "controlkb=info",
        1 => "controlkb=debug",
        _ => "controlkb=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so JSON output on stdout stays pipeable.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Build {
            controls_dir,
            source_root,
            categories,
            out,
        } => cmd_build(controls_dir, source_root, categories, out).await,
        Command::List { kb, json } => cmd_list(kb, json).await,
        Command::Show { title, kb } => cmd_show(&title, kb).await,
        Command::Request { key, results } => cmd_request(&key, results).await,
        Command::Context { title, kb, results } => cmd_context(&title, kb, results).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_build(
    controls_dir: Option<PathBuf>,
    source_root: Option<PathBuf>,
    categories: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let config = load_config()?;
    let mut build = BuildConfig::from(&config);
    if let Some(dir) = controls_dir {
        build.controls_dir = dir;
    }
    if let Some(root) = source_root {
        build.source_root = root;
    }
    if let Some(table) = categories {
        build.category_table = table;
    }
    if let Some(out) = out {
        build.output = out;
    }

    info!(
        controls_dir = %build.controls_dir.display(),
        output = %build.output.display(),
        "building knowledge base"
    );

    let reporter = CliProgress::new();
    let result = controlkb_core::pipeline::build_knowledge_base(&build, &reporter).await;
    if result.is_err() {
        reporter.spinner.abandon_with_message("Build failed");
    }
    let result = result?;

    // Print summary
    println!();
    println!("  Knowledge base written!");
    println!("  Controls:     {}", result.control_count);
    println!("  Dependencies: {}", result.dependency_count);
    println!("  Request keys: {}", result.request_key_count);
    println!("  Path:         {}", result.output.display());
    println!(
        "  Time:         {:.1}s",
        result.elapsed.as_secs_f64()
    );
    println!();

    Ok(())
}

async fn cmd_list(kb: Option<PathBuf>, json: bool) -> Result<()> {
    let kb = open_kb(kb)?;
    info!(controls = kb.len(), "listing controls");

    if json {
        println!("{}", serde_json::to_string_pretty(&kb.summaries())?);
        return Ok(());
    }

    for (category, summaries) in kb.by_category() {
        println!("{category} ({})", summaries.len());
        for summary in summaries {
            println!("  {}", summary.title);
        }
    }
    Ok(())
}

async fn cmd_show(title: &str, kb: Option<PathBuf>) -> Result<()> {
    let kb = open_kb(kb)?;
    let control = kb.control(title)?;
    println!("{}", serde_json::to_string_pretty(control)?);
    Ok(())
}

async fn cmd_request(key: &str, results: Option<PathBuf>) -> Result<()> {
    let store = open_results(results)?;
    let record = store.lookup(key)?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_context(title: &str, kb: Option<PathBuf>, results: Option<PathBuf>) -> Result<()> {
    let kb = open_kb(kb)?;
    let store = open_results(results)?;
    let context = build_context(&kb, &store, title)?;

    if !context.missing_keys.is_empty() {
        info!(
            title,
            missing = context.missing_keys.len(),
            "some request keys have no stored result"
        );
    }

    println!("{}", serde_json::to_string_pretty(&context)?);
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn open_kb(path: Option<PathBuf>) -> Result<KnowledgeBase> {
    let path = match path {
        Some(p) => p,
        None => PathBuf::from(load_config()?.paths.knowledge_base),
    };
    Ok(KnowledgeBase::load(&path)?)
}

fn open_results(path: Option<PathBuf>) -> Result<ResultStore> {
    let path = match path {
        Some(p) => p,
        None => PathBuf::from(load_config()?.paths.requests_results),
    };
    Ok(ResultStore::load(&path)?)
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
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
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

    fn control_analyzed(&self, file_name: &str, current: usize, total: usize) {
        self.spinner.set_message(format!(
            "Analyzing [{current}/{total}] {file_name}"
        ));
    }

    fn done(&self, _result: &BuildResult) {
        self.spinner.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_build_overrides() {
        let cli = Cli::try_parse_from([
            "controlkb",
            "-vv",
            "build",
            "--controls-dir",
            "controls",
            "--out",
            "kb.json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Build {
                controls_dir,
                out,
                categories,
                ..
            } => {
                assert_eq!(controls_dir, Some(PathBuf::from("controls")));
                assert_eq!(out, Some(PathBuf::from("kb.json")));
                assert!(categories.is_none());
            }
            _ => panic!("expected build command"),
        }
    }

    #[test]
    fn parses_context_with_global_log_format() {
        let cli = Cli::try_parse_from([
            "controlkb",
            "context",
            "Kerberoasting",
            "--results",
            "results.json",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(
            cli.command,
            Command::Context { ref title, .. } if title == "Kerberoasting"
        ));
    }
}
