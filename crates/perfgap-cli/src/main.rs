//! Perfgap CLI
//!
//! Command-line interface for performance gap analysis.
//!
//! ## Usage
//!
//! ```bash
//! # Analyze a snapshot
//! perfgap analyze --input snapshot.yaml
//!
//! # JSON report with a fixed timestamp
//! perfgap analyze --input snapshot.yaml --format json --analyzed-at 2025-12-20T00:00:00Z
//!
//! # Custom direction table and policies
//! perfgap analyze --input snapshot.yaml --config runtime.yaml --exclude-degenerate
//!
//! # Validate a snapshot
//! perfgap snapshot validate snapshot.yaml
//! ```
//!
//! ## Exit Codes
//!
//! - 0: Report produced, no Critical component
//! - 1: Report produced, at least one Critical component
//! - 2: Input rejected
//! - 3: Error

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use perfgap_core::{AnalysisFailure, GapReport, PerformanceStatus, PriorityLevel, Snapshot};
use perfgap_runtime::{DegeneratePolicy, RuntimeConfig, RuntimeOrchestrator, RuntimeResult};

/// Perfgap: performance gap analysis for food-system components
#[derive(Parser)]
#[command(name = "perfgap")]
#[command(version)]
#[command(about = "Compute, rank and explain performance gaps against benchmarks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a snapshot and print the gap report
    Analyze {
        /// Path to the snapshot (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Path to a runtime config (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Show per-component interpretations and the calculation method
        #[arg(long)]
        explain: bool,

        /// Gaps above this percentage count as significant
        #[arg(long)]
        minor_gap_threshold: Option<f64>,

        /// Drop degenerate components instead of rejecting the snapshot
        #[arg(long)]
        exclude_degenerate: bool,

        /// Include raw observed/benchmark values in each gap entry
        #[arg(long)]
        debug_fields: bool,

        /// Explicit timestamp for reproducible runs (ISO 8601 / RFC 3339).
        /// Example: --analyzed-at 2025-12-20T00:00:00Z
        #[arg(long, value_parser = parse_datetime)]
        analyzed_at: Option<DateTime<Utc>>,
    },

    /// Snapshot commands
    Snapshot {
        #[command(subcommand)]
        action: SnapshotAction,
    },

    /// Runtime config commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum SnapshotAction {
    /// Check that every component resolves to a valid metric
    Validate {
        /// Path to the snapshot file
        path: PathBuf,

        /// Runtime config supplying the direction table
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show snapshot contents with resolved directions
    Show {
        /// Path to the snapshot file
        path: PathBuf,

        /// Runtime config supplying the direction table
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective runtime config as YAML
    Show {
        /// Path to the runtime config (defaults apply when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Parse ISO 8601 / RFC 3339 datetime string to DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("Invalid datetime format: {}. Expected ISO 8601/RFC 3339 (e.g., 2025-12-20T00:00:00Z)", e))
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    match run() {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(3)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            format,
            explain,
            minor_gap_threshold,
            exclude_degenerate,
            debug_fields,
            analyzed_at,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(threshold) = minor_gap_threshold {
                config.analysis.minor_gap_threshold = threshold;
            }
            if exclude_degenerate {
                config.degenerate_policy = DegeneratePolicy::Exclude;
            }
            if debug_fields {
                config.analysis.include_debug_fields = true;
            }
            if analyzed_at.is_some() {
                config.determinism.analyzed_at = analyzed_at;
            }
            config.validate().context("Invalid command-line overrides")?;

            analyze_command(&input, config, format, explain)
        }

        Commands::Snapshot { action } => match action {
            SnapshotAction::Validate { path, config } => {
                validate_snapshot(&path, &load_config(config.as_deref())?)
            }
            SnapshotAction::Show { path, config } => {
                show_snapshot(&path, &load_config(config.as_deref())?)
            }
        },

        Commands::Config { action } => match action {
            ConfigAction::Show { config } => show_config(&load_config(config.as_deref())?),
        },
    }
}

fn load_config(path: Option<&Path>) -> Result<RuntimeConfig> {
    match path {
        Some(path) => RuntimeConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path)),
        None => Ok(RuntimeConfig::default()),
    }
}

fn load_snapshot(path: &Path) -> Result<Snapshot> {
    Snapshot::from_file(path).with_context(|| format!("Failed to load snapshot from {:?}", path))
}

fn analyze_command(
    input: &Path,
    config: RuntimeConfig,
    format: OutputFormat,
    explain: bool,
) -> Result<ExitCode> {
    let snapshot = load_snapshot(input)?;
    let orchestrator = RuntimeOrchestrator::new(config);

    let result = match orchestrator.analyze_snapshot(&snapshot) {
        Ok(result) => result,
        Err(e) => match e.failure() {
            Some(failure) => {
                print_failure(&failure, format)?;
                return Ok(ExitCode::from(2));
            }
            None => return Err(e).context("Analysis failed"),
        },
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            print_text_result(snapshot.name.as_deref(), &result, explain);
        }
    }

    Ok(if result.has_critical() {
        ExitCode::from(1)
    } else {
        ExitCode::from(0)
    })
}

fn print_failure(failure: &AnalysisFailure, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(failure)?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            eprintln!("REJECTED");
            eprintln!();
            eprintln!("Kind: {:?}", failure.kind);
            if let Some(component) = &failure.component_id {
                eprintln!("Component: {}", component);
            }
            eprintln!("Reason: {}", failure.message);
        }
    }
    Ok(())
}

fn print_text_result(name: Option<&str>, result: &RuntimeResult, explain: bool) {
    let report = &result.report;
    let summary = &report.summary;

    match name {
        Some(name) => println!("PERFORMANCE GAP ANALYSIS: {}", name),
        None => println!("PERFORMANCE GAP ANALYSIS"),
    }
    println!();
    println!("Components analysed: {}", summary.total_components);
    println!(
        "Significant gaps (> {}%): {}",
        summary.minor_gap_threshold, summary.components_with_significant_gaps
    );
    println!("Average gap: {:.2}%", summary.average_gap_percent);
    println!(
        "Worst performer: {} ({:.2}% gap, {:.2}% displayed)",
        summary.worst_performer_name, summary.worst_actual_gap_percent, summary.largest_gap_percent
    );
    println!();

    println!("Priority distribution:");
    for level in PriorityLevel::ALL.iter().rev() {
        let count = summary.priority_distribution.get(level).copied().unwrap_or(0);
        println!("  {}: {}", level.label(), count);
    }
    println!();

    if let Some(note) = &summary.ranking_note {
        println!("Note: {}", note);
        println!();
    }

    if report.priority_actions.is_empty() {
        println!("Every component is above its benchmark.");
    } else {
        println!("Priority actions:");
        for (i, action) in report.priority_actions.iter().enumerate() {
            println!("  {}. {}", i + 1, action);
        }
    }

    if !result.excluded.is_empty() {
        println!();
        println!("Excluded:");
        for excluded in &result.excluded {
            println!("  - {}: {}", excluded.component_id, excluded.failure.message);
        }
    }

    println!();
    println!("Analyzed at: {}", result.analyzed_at.to_rfc3339());

    if explain {
        print_explanation(report);
    }
}

fn print_explanation(report: &GapReport) {
    println!();
    println!("--- Components ---");

    // Ranked components first, then those above benchmark
    let above = report
        .gaps
        .iter()
        .filter(|(_, g)| g.performance_status == PerformanceStatus::AboveBenchmark)
        .map(|(id, _)| id);
    let ordered = report.priority_ranking.iter().chain(above);

    for id in ordered {
        let Some(gap) = report.gaps.get(id) else {
            continue;
        };

        println!();
        println!("{} [{}]", gap.component_name, gap.interpretation.badge_label);
        println!("  {}", gap.interpretation.title);
        println!("  {}", gap.interpretation.description);
        println!(
            "  Gap: {:.2}% (actual {:.2}%), {}, {}",
            gap.gap_percent,
            gap.actual_gap_percent,
            gap.performance_status.label(),
            gap.direction
        );
        match gap.performance_efficiency {
            Some(efficiency) => println!("  Efficiency: {:.2}% of benchmark", efficiency),
            None => println!("  Efficiency: out of range"),
        }
        if let (Some(observed), Some(benchmark)) = (gap.debug_observed, gap.debug_benchmark) {
            println!("  Observed: {}, benchmark: {}", observed, benchmark);
        }
        if gap.priority_level.requires_immediate_attention() {
            println!("  Requires immediate attention");
        }
        println!("  Action: {}", gap.interpretation.recommended_action);
    }

    let context = &report.mathematical_context;
    println!();
    println!("--- Method ({}) ---", context.calculation_method);
    println!();
    for (direction, formula) in &context.formula {
        println!("  {}: {}", direction, formula);
    }
    println!();
    println!("{}", context.description);
    println!("Invariants validated: {}", if context.validated { "yes" } else { "NO" });
}

fn validate_snapshot(path: &Path, config: &RuntimeConfig) -> Result<ExitCode> {
    let snapshot = load_snapshot(path)?;

    match snapshot.into_metrics(&config.directions) {
        Ok(metrics) => {
            println!("Snapshot is valid: {}", snapshot.name.as_deref().unwrap_or("(unnamed)"));
            println!();
            println!("Components: {}", metrics.len());
            Ok(ExitCode::from(0))
        }
        Err(e) => {
            eprintln!("Snapshot validation failed: {}", e);
            Ok(ExitCode::from(2))
        }
    }
}

fn show_snapshot(path: &Path, config: &RuntimeConfig) -> Result<ExitCode> {
    let snapshot = load_snapshot(path)?;

    println!("Snapshot: {}", snapshot.name.as_deref().unwrap_or("(unnamed)"));
    if !snapshot.metadata.is_empty() {
        println!();
        println!("Metadata:");
        for (key, value) in &snapshot.metadata {
            println!("  {}: {}", key, value);
        }
    }
    println!();

    let metrics = snapshot
        .into_metrics(&config.directions)
        .with_context(|| format!("Snapshot {:?} does not resolve", path))?;

    println!("Components:");
    for metric in &metrics {
        println!(
            "  {} ({}): observed {}, benchmark {}, {}",
            metric.component_id,
            metric.component_name,
            metric.observed_value,
            metric.benchmark_value,
            metric.direction
        );
    }

    Ok(ExitCode::from(0))
}

fn show_config(config: &RuntimeConfig) -> Result<ExitCode> {
    let yaml = serde_yaml::to_string(config)?;
    print!("{}", yaml);
    Ok(ExitCode::from(0))
}
