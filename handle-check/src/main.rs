//! Handle Check CLI Application
//!
//! Expands a seed name into every combination of its letters and reports
//! which of them are unclaimed on the configured profile service.

mod ui;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{CommandFactory, Parser};
use console::Term;
use handle_check_lib::{
    generate_powerset, load_env_config, parse_timeout_string, validate_endpoint,
    validate_workers, CheckConfig, ConcurrentProcessor, ConfigManager, ErrorPolicy,
    HandleCheckError, LineReporter, OutputFormat, ResultSink,
};
use std::io::BufRead;
use std::process;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Yellow.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Runs with more candidates than this ask for confirmation on a terminal.
const LARGE_RUN_THRESHOLD: usize = 5000;

const EXIT_USAGE: i32 = 1;
const EXIT_FAILURE: i32 = 2;
const EXIT_INTERRUPTED: i32 = 130;

/// CLI arguments for handle-check
#[derive(Parser, Debug)]
#[command(name = "handle-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Find unclaimed handles among the letter combinations of a name")]
#[command(
    long_about = "Find unclaimed handles among the letter combinations of a name.\n\nEvery subset of the seed's letters is checked against the profile endpoint by a fixed pool of workers, each pausing between requests. Names shorter than 4 characters are reported unavailable without a request.\n\nLong flags take two dashes (--name alice, or -n alice); single-dash long flags such as -name are not accepted."
)]
#[command(styles = STYLES)]
pub struct Args {
    /// Base name used for generation
    #[arg(
        short = 'n',
        long = "name",
        value_name = "NAME",
        help_heading = "Input"
    )]
    pub name: Option<String>,

    /// Print candidates without checking them
    #[arg(long = "dry-run", help_heading = "Input")]
    pub dry_run: bool,

    /// Output all names, even taken ones
    #[arg(short = 'v', long = "verbose", help_heading = "Output Format")]
    pub verbose: bool,

    /// Output results as JSON lines
    #[arg(short = 'j', long = "json", help_heading = "Output Format")]
    pub json: bool,

    /// Number of concurrent workers [default: 4]
    #[arg(
        short = 'w',
        long = "workers",
        value_name = "N",
        help_heading = "Performance"
    )]
    pub workers: Option<usize>,

    /// Pause between requests of one worker, in ms [default: 500]
    #[arg(
        short = 's',
        long = "sleep",
        value_name = "MS",
        help_heading = "Performance"
    )]
    pub sleep: Option<u64>,

    /// Check names in generation order instead of longest first
    #[arg(long = "no-sort", help_heading = "Performance")]
    pub no_sort: bool,

    /// Skip the confirmation prompt for large runs
    #[arg(short = 'y', long = "yes", help_heading = "Performance")]
    pub yes: bool,

    /// Profile endpoint the name is appended to [default: https://twitter.com/]
    #[arg(long = "endpoint", value_name = "URL", help_heading = "Protocol")]
    pub endpoint: Option<String>,

    /// Per-request timeout, e.g. "10s" or "1m" [default: 10s]
    #[arg(long = "timeout", value_name = "DURATION", help_heading = "Protocol")]
    pub timeout: Option<String>,

    /// Report failed lookups as unavailable instead of aborting
    #[arg(long = "keep-going", help_heading = "Protocol")]
    pub keep_going: bool,

    /// Use specific config file instead of automatic discovery
    #[arg(long = "config", value_name = "FILE", help_heading = "Configuration")]
    pub config: Option<String>,

    /// Show diagnostic logging on stderr
    #[arg(short = 'd', long = "debug", help_heading = "Configuration")]
    pub debug: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    init_logging(args.debug);

    if let Err(message) = validate_args(&args) {
        print_usage(&message);
        process::exit(EXIT_USAGE);
    }

    if let Err(e) = run_handle_check(args).await {
        eprintln!("Error: {}", e);
        process::exit(exit_code(&e));
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins unless `--debug` is set.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("handle_check=debug,handle_check_lib=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_usage(message: &str) {
    let mut command = Args::command();
    eprintln!("{}", command.render_usage());
    eprintln!();
    eprintln!("{}", message);
    eprintln!("For more information, try '--help'.");
}

/// Validate command line arguments before any work starts.
fn validate_args(args: &Args) -> Result<(), String> {
    match args.name.as_deref() {
        Some(name) if !name.trim().is_empty() => {}
        _ => {
            return Err("You have to provide a name with --name \"examplename\"".to_string());
        }
    }

    if let Some(workers) = args.workers {
        validate_workers(workers).map_err(|e| e.to_string())?;
    }

    if let Some(endpoint) = &args.endpoint {
        validate_endpoint(endpoint).map_err(|e| e.to_string())?;
    }

    if let Some(timeout) = &args.timeout {
        if parse_timeout_string(timeout).is_none() {
            return Err(format!(
                "Invalid timeout '{}'. Use format like '5s', '30s', '2m'",
                timeout
            ));
        }
    }

    Ok(())
}

/// Map a run error to the process exit status.
fn exit_code(error: &HandleCheckError) -> i32 {
    match error {
        HandleCheckError::Cancelled { .. } => EXIT_INTERRUPTED,
        e if e.is_usage_error() => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

/// Main handle checking logic
async fn run_handle_check(args: Args) -> Result<(), HandleCheckError> {
    let config = build_config(&args)?;
    let seed = args.name.as_deref().unwrap_or_default().trim();
    let candidates = generate_powerset(seed)?;

    if args.dry_run {
        print_candidates(&candidates, args.json)?;
        eprintln!("{} candidates would be checked", candidates.len());
        return Ok(());
    }

    if candidates.len() > LARGE_RUN_THRESHOLD
        && !args.yes
        && !confirm_large_run(&candidates, &config)?
    {
        eprintln!("Aborted.");
        return Ok(());
    }

    let processor = ConcurrentProcessor::new(config.clone())?;

    let cancel = processor.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupt received, cancelling");
            cancel.cancel();
        }
    });

    if config.verbose {
        ui::print_header(seed, candidates.len(), &config);
    }

    let mut reporter: Box<dyn ResultSink> = if !args.json && Term::stdout().is_term() {
        Box::new(ui::ConsoleReporter::new(config.verbose))
    } else {
        let format = if args.json {
            OutputFormat::JsonLines
        } else {
            OutputFormat::Text
        };
        Box::new(LineReporter::stdout(config.verbose, format))
    };

    let start_time = Instant::now();
    let summary = processor.run(&candidates, reporter.as_mut()).await?;

    if config.verbose {
        ui::print_summary(&summary, start_time.elapsed());
    }

    Ok(())
}

/// Build CheckConfig from CLI arguments with config file integration.
///
/// Precedence order (highest to lowest):
/// 1. CLI arguments
/// 2. Environment variables (HC_*)
/// 3. Config file (--config / HC_CONFIG, or discovered files)
/// 4. Built-in defaults
fn build_config(args: &Args) -> Result<CheckConfig, HandleCheckError> {
    let env_config = load_env_config();
    let manager = ConfigManager::new(args.debug);

    let file_config = match args.config.as_ref().or(env_config.config.as_ref()) {
        Some(path) => manager.load_file(path)?,
        None => manager.discover_and_load(),
    };

    let mut config = CheckConfig::default();
    if let Some(defaults) = &file_config.defaults {
        config = defaults.apply_to(config);
    }
    config = env_config.apply_to(config);

    Ok(apply_cli_args_to_config(config, args))
}

/// Apply explicit CLI arguments on top of the merged configuration.
///
/// Boolean flags only ever enable their behaviour.
fn apply_cli_args_to_config(mut config: CheckConfig, args: &Args) -> CheckConfig {
    if let Some(workers) = args.workers {
        config = config.with_workers(workers);
    }
    if let Some(sleep) = args.sleep {
        config = config.with_delay(Duration::from_millis(sleep));
    }
    if let Some(endpoint) = &args.endpoint {
        config = config.with_endpoint(endpoint.clone());
    }
    if let Some(timeout) = args.timeout.as_deref().and_then(parse_timeout_string) {
        config = config.with_request_timeout(Duration::from_secs(timeout));
    }
    if args.verbose {
        config = config.with_verbose(true);
    }
    if args.no_sort {
        config = config.with_sort_by_length(false);
    }
    if args.keep_going {
        config = config.with_error_policy(ErrorPolicy::TreatAsTaken);
    }
    config
}

fn print_candidates(candidates: &[String], json: bool) -> Result<(), HandleCheckError> {
    if json {
        let rendered = serde_json::to_string_pretty(candidates)
            .map_err(|e| HandleCheckError::internal(format!("JSON encoding failed: {}", e)))?;
        println!("{}", rendered);
    } else {
        for candidate in candidates {
            println!("{}", candidate);
        }
    }
    Ok(())
}

/// Ask before a large run when stderr is a terminal. Non-interactive runs proceed.
fn confirm_large_run(
    candidates: &[String],
    config: &CheckConfig,
) -> Result<bool, HandleCheckError> {
    let term = Term::stderr();
    if !term.is_term() {
        return Ok(true);
    }

    eprint!(
        "Will check {} names (~{} with {} workers). Proceed? [Y/n] ",
        candidates.len(),
        ui::format_duration(estimate_duration(candidates.len(), config)),
        config.workers
    );

    let mut input = String::new();
    std::io::stdin().lock().read_line(&mut input)?;
    let answer = input.trim().to_lowercase();
    Ok(!(answer == "n" || answer == "no"))
}

/// Lower bound on run time from the inter-request delay alone.
fn estimate_duration(candidates: usize, config: &CheckConfig) -> Duration {
    let per_worker = candidates.div_ceil(config.workers.max(1)) as u32;
    config.delay.saturating_mul(per_worker.saturating_sub(1))
}
