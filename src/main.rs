use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use tideline_core::{
    ExposureLevel, Insight, OutputFormat, RepositoryRanking, TidelineConfig, TrendResult,
};
use tideline_engine::Evaluator;
use tideline_history::GitRepository;

#[derive(Parser)]
#[command(
    name = "tideline",
    version,
    about = "Temporal complexity evaluation for Python files",
    long_about = "Tideline replays a file's git history, scores the complexity of every\n\
                   version, and fits a trend to forecast quality decay.\n\n\
                   Examples:\n  \
                     tideline evaluate src/app.py          Trend, decay forecast, and exposure\n  \
                     tideline insights src/app.py          Threshold-triggered warnings\n  \
                     tideline forecast src/app.py          Decay forecast only\n  \
                     tideline rank --max-files 20          Rank the repository by decay risk\n  \
                     tideline init                         Write a default .tideline.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .tideline.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate the complexity trend of a file
    #[command(long_about = "Evaluate the complexity trend of a file.\n\n\
        Walks the commits that touched the file within the window, scores each\n\
        version, and reports the trend slope, growth, decay forecast, exposure\n\
        level, and confidence.\n\n\
        Examples:\n  tideline evaluate src/app.py\n  tideline evaluate src/app.py --window 90 --timeline\n  tideline evaluate src/app.py --fail-on high")]
    Evaluate {
        /// File to evaluate (absolute, or relative to the current directory)
        file: PathBuf,

        #[command(flatten)]
        history: HistoryArgs,

        /// Print every snapshot in the evolution series
        #[arg(long)]
        timeline: bool,

        /// Exit with non-zero code if exposure meets this level
        #[arg(
            long,
            long_help = "Exit with non-zero code if the file's exposure is at or above this level.\n\nLevels: low < medium < high. Useful in CI to flag files drifting toward decay."
        )]
        fail_on: Option<ExposureLevel>,
    },
    /// List threshold-triggered insights for a file
    #[command(long_about = "List threshold-triggered insights for a file.\n\n\
        Reports complexity_growth when the trend slope exceeds the growth\n\
        threshold and quality_decay when the decay forecast exceeds the decay\n\
        threshold, most severe first. Prints nothing if the file cannot be evaluated.\n\n\
        Examples:\n  tideline insights src/app.py")]
    Insights {
        /// File to inspect
        file: PathBuf,

        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Print the decay forecast for a file
    #[command(long_about = "Print the decay forecast for a file.\n\n\
        A value between 0.0 and 1.0; 0.0 when the file cannot be evaluated.\n\n\
        Examples:\n  tideline forecast src/app.py\n  tideline forecast src/app.py --format json")]
    Forecast {
        /// File to forecast
        file: PathBuf,

        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Rank repository files by decay forecast
    #[command(long_about = "Rank repository files by decay forecast.\n\n\
        Discovers Python files (respecting .gitignore, skipping virtualenvs, caches,\n\
        and build output), evaluates them in path order until --max-files succeed,\n\
        and ranks the results. Files without enough history are listed as skipped.\n\n\
        Examples:\n  tideline rank\n  tideline rank --max-files 200 --fail-on high\n  tideline rank --format markdown > report.md")]
    Rank {
        #[command(flatten)]
        history: HistoryArgs,

        /// Stop after this many files evaluate successfully (default: 50)
        #[arg(long)]
        max_files: Option<usize>,

        /// Exit with non-zero code if any file's exposure meets this level
        #[arg(long)]
        fail_on: Option<ExposureLevel>,
    },
    /// Create a default .tideline.toml configuration file
    #[command(long_about = "Create a default .tideline.toml configuration file.\n\n\
        Generates a commented template with every available option.\n\
        Fails if .tideline.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Flags shared by every history-reading subcommand.
#[derive(clap::Args)]
struct HistoryArgs {
    /// Repository path (default: current directory)
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// History window in days (default: 180)
    #[arg(long)]
    window: Option<u32>,

    /// Maximum commits read per file (default: 100)
    #[arg(long)]
    max_commits: Option<usize>,

    /// Minimum commits required before evaluating (default: 2)
    #[arg(long)]
    min_commits: Option<usize>,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

const DEFAULT_CONFIG: &str = r#"# Tideline Configuration
# Every value below is the built-in default. Environment variables
# (TIDELINE_WINDOW_DAYS, TIDELINE_MAX_COMMITS, TIDELINE_MIN_COMMITS,
# TIDELINE_MAX_FILES) override this file; command-line flags override both.

[evaluation]
# window_days = 180
# max_commits = 100
# min_commits = 2
# max_files = 50

[thresholds]
# growth_slope = 0.5
# decay_insight = 0.7
# exposure_high = 0.7
# exposure_medium = 0.4
# pattern_slope = 0.5
# mean_window = 5
# low_confidence_below = 5

[discovery]
# Extra directory names to skip during `tideline rank`
# exclude_dirs = ["migrations", "vendor"]
"#;

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1m\x1b[36m~\x1b[0m \x1b[1mtideline\x1b[0m v{version}: complexity trends from git history\n");

        println!("Quick start:");
        println!("  \x1b[36mtideline init\x1b[0m                 Create a .tideline.toml config file");
        println!("  \x1b[36mtideline evaluate app.py\x1b[0m      Evaluate one file's complexity trend");
        println!("  \x1b[36mtideline rank\x1b[0m                 Rank files by decay forecast\n");

        println!("All commands:");
        println!("  \x1b[32mevaluate\x1b[0m  Trend, growth, decay forecast, exposure, confidence");
        println!("  \x1b[32minsights\x1b[0m  Threshold-triggered growth and decay warnings");
        println!("  \x1b[32mforecast\x1b[0m  Decay forecast only");
        println!("  \x1b[32mrank\x1b[0m      Repository-wide ranking and health score");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("tideline v{version}: complexity trends from git history\n");

        println!("Quick start:");
        println!("  tideline init                 Create a .tideline.toml config file");
        println!("  tideline evaluate app.py      Evaluate one file's complexity trend");
        println!("  tideline rank                 Rank files by decay forecast\n");

        println!("All commands:");
        println!("  evaluate  Trend, growth, decay forecast, exposure, confidence");
        println!("  insights  Threshold-triggered growth and decay warnings");
        println!("  forecast  Decay forecast only");
        println!("  rank      Repository-wide ranking and health score");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'tideline <command> --help' for details.");
}

fn init_tracing(verbose: bool, use_color: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .init();
}

/// Resolve configuration: file, then environment, then flags.
fn load_config(path: Option<&Path>) -> Result<TidelineConfig> {
    let mut config = match path {
        Some(path) => TidelineConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".tideline.toml");
            if default_path.exists() {
                TidelineConfig::from_file(default_path)?
            } else {
                TidelineConfig::default()
            }
        }
    };
    config.apply_env()?;
    Ok(config)
}

fn apply_history_args(config: &mut TidelineConfig, args: &HistoryArgs) -> Result<()> {
    if let Some(window) = args.window {
        config.evaluation.window_days = window;
    }
    if let Some(max_commits) = args.max_commits {
        config.evaluation.max_commits = max_commits;
    }
    if let Some(min_commits) = args.min_commits {
        config.evaluation.min_commits = min_commits;
    }
    config.validate()?;
    Ok(())
}

fn open_repository(path: &Path) -> Result<GitRepository> {
    GitRepository::open(path).map_err(|e| {
        miette::miette!(
            help = "Run tideline from inside a git repository, or specify --repo to one",
            "{e}"
        )
    })
}

/// Files named on the command line are relative to the current directory
/// when they exist there; otherwise they are taken as repository-relative.
fn locate_file(file: &Path) -> PathBuf {
    if file.is_relative() && file.exists() {
        if let Ok(absolute) = file.canonicalize() {
            return absolute;
        }
    }
    file.to_path_buf()
}

fn paint(text: &str, code: &str, use_color: bool) -> String {
    if use_color {
        format!("\x1b[{code}m{text}\x1b[0m")
    } else {
        text.to_string()
    }
}

fn exposure_color(level: ExposureLevel) -> &'static str {
    match level {
        ExposureLevel::High => "1;31",
        ExposureLevel::Medium => "33",
        ExposureLevel::Low => "32",
    }
}

fn print_trend(result: &TrendResult, format: OutputFormat, timeline: bool, use_color: bool) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(result).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## `{}`\n", result.file_path);
            println!("| Metric | Value |");
            println!("|--------|-------|");
            println!("| Commits evaluated | {} (last {} days) |", result.commits_evaluated, result.window_days);
            println!("| Trend | {:+.2}/month ({}) |", result.slope, result.quality_pattern);
            println!("| Current complexity | {} |", result.current_complexity);
            println!("| Growth | {:+.1}% |", result.growth_rate * 100.0);
            println!("| Decay forecast | {:.0}% |", result.decay_forecast * 100.0);
            println!("| Exposure | **{}** |", result.exposure_level);
            println!(
                "| Confidence | {}% ({}) |",
                result.confidence_score.percentage(),
                result.confidence_score.description()
            );
            println!("| Authors | {} |", result.author_count);
            println!("| Change frequency | {:.1}/month |", result.change_frequency);
            if let Some(warning) = &result.confidence_warning {
                println!("\n> **Warning:** {warning}");
            }
            println!("\n{}\n", result.description());
            for line in result.recommendations() {
                println!("- {line}");
            }
            if timeline {
                println!("\n| Date | Commit | Author | Complexity | Lines |");
                println!("|------|--------|--------|------------|-------|");
                for s in &result.timetable {
                    println!(
                        "| {} | `{}` | {} | {} | {} |",
                        s.timestamp.format("%Y-%m-%d"),
                        &s.commit_id[..s.commit_id.len().min(8)],
                        s.author,
                        s.complexity,
                        s.lines_of_code
                    );
                }
            }
        }
        OutputFormat::Text => {
            println!(
                "{}  ({} commits over {} days)",
                paint(&result.file_path, "1", use_color),
                result.commits_evaluated,
                result.window_days
            );
            println!("  Trend:        {:+.2}/month  {}", result.slope, result.quality_pattern);
            println!(
                "  Complexity:   {} (growth {:+.1}%)",
                result.current_complexity,
                result.growth_rate * 100.0
            );
            let level = result.exposure_level.to_string();
            println!(
                "  Decay risk:   {:.0}%  {}",
                result.decay_forecast * 100.0,
                paint(&level, exposure_color(result.exposure_level), use_color)
            );
            println!(
                "  Confidence:   {}% ({})",
                result.confidence_score.percentage(),
                result.confidence_score.description()
            );
            println!(
                "  Activity:     {} author(s), {:.1} changes/month",
                result.author_count, result.change_frequency
            );
            if let Some(warning) = &result.confidence_warning {
                println!("  {}", paint(&format!("warning: {warning}"), "33", use_color));
            }
            println!("\n  {}", result.description());
            for line in result.recommendations() {
                println!("    - {line}");
            }
            if timeline {
                println!();
                for s in &result.timetable {
                    println!(
                        "  {}  {}  {:>4}  {:>5} lines  {}",
                        s.timestamp.format("%Y-%m-%d %H:%M"),
                        &s.commit_id[..s.commit_id.len().min(8)],
                        s.complexity,
                        s.lines_of_code,
                        s.author
                    );
                }
            }
        }
    }
    Ok(())
}

fn print_insights(file: &Path, insights: &[Insight], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(insights).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("## Insights for `{}`\n", file.display());
            if insights.is_empty() {
                println!("No insights.");
            }
            for i in insights {
                println!(
                    "- **{}** (severity {:.2}, confidence {:.0}%): {}",
                    i.kind,
                    i.severity,
                    i.confidence * 100.0,
                    i.description
                );
            }
        }
        OutputFormat::Text => {
            if insights.is_empty() {
                println!("No insights for {}.", file.display());
            }
            for i in insights {
                println!(
                    "{:<18} severity {:.2}  confidence {:>3.0}%  {}",
                    i.kind.to_string(),
                    i.severity,
                    i.confidence * 100.0,
                    i.description
                );
            }
        }
    }
    Ok(())
}

fn print_ranking(ranking: &RepositoryRanking, format: OutputFormat, verbose: bool, use_color: bool) -> Result<()> {
    let dist = ranking.distribution();
    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "ranking": ranking,
                "distribution": dist,
                "healthScore": ranking.health_score(),
            });
            println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        }
        OutputFormat::Markdown => {
            println!("# Tideline ranking: `{}`\n", ranking.root.display());
            println!(
                "**Health score:** {:.1}/10 ({} improving, {} stable, {} declining)\n",
                ranking.health_score(),
                dist.improving,
                dist.stable,
                dist.declining
            );
            println!("| # | File | Exposure | Decay | Trend | Pattern | Commits |");
            println!("|---|------|----------|-------|-------|---------|---------|");
            for (i, e) in ranking.evaluations.iter().enumerate() {
                println!(
                    "| {} | `{}` | {} | {:.0}% | {:+.2} | {} | {} |",
                    i + 1,
                    e.file_path,
                    e.exposure_level,
                    e.decay_forecast * 100.0,
                    e.slope,
                    e.quality_pattern,
                    e.commits_evaluated
                );
            }
            if !ranking.skipped.is_empty() {
                println!("\n<details><summary>{} skipped</summary>\n", ranking.skipped.len());
                for s in &ranking.skipped {
                    println!("- `{}`: {}", s.path, s.reason);
                }
                println!("\n</details>");
            }
        }
        OutputFormat::Text => {
            if ranking.evaluations.is_empty() {
                println!("No files had enough history to evaluate.");
            } else {
                println!(
                    "{:>3}  {:<8} {:>6} {:>8}  {:<10} FILE",
                    "#", "EXPOSURE", "DECAY", "TREND", "PATTERN"
                );
                for (i, e) in ranking.evaluations.iter().enumerate() {
                    let level = format!("{:<8}", e.exposure_level.to_string());
                    println!(
                        "{:>3}  {} {:>5.0}% {:>+8.2}  {:<10} {}",
                        i + 1,
                        paint(&level, exposure_color(e.exposure_level), use_color),
                        e.decay_forecast * 100.0,
                        e.slope,
                        e.quality_pattern.to_string(),
                        e.file_path
                    );
                }
            }
            println!(
                "\nHealth score: {:.1}/10 ({} improving, {} stable, {} declining)",
                ranking.health_score(),
                dist.improving,
                dist.stable,
                dist.declining
            );
            if !ranking.skipped.is_empty() {
                println!("Skipped {} file(s) without enough history.", ranking.skipped.len());
                if verbose {
                    for s in &ranking.skipped {
                        println!("  {}: {}", s.path, s.reason);
                    }
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))?;
    human_panic::setup_panic!();

    let cli = Cli::parse();

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };
    init_tracing(cli.verbose, use_color);

    let mut config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, ?config, "configuration loaded");

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Evaluate {
            ref file,
            ref history,
            timeline,
            fail_on,
        }) => {
            apply_history_args(&mut config, history)?;
            let repo = open_repository(&history.repo)?;
            let window = config.evaluation.window_days;
            let evaluator = Evaluator::new(&repo, config);

            let result = evaluator.evaluate_file(&locate_file(file), window)?;
            print_trend(&result, cli.format, timeline, use_color)?;

            if let Some(threshold) = fail_on {
                if result.exposure_level.meets_threshold(threshold) {
                    std::process::exit(1);
                }
            }
        }
        Some(Command::Insights {
            ref file,
            ref history,
        }) => {
            apply_history_args(&mut config, history)?;
            let repo = open_repository(&history.repo)?;
            let evaluator = Evaluator::new(&repo, config);

            let insights = evaluator.generate_insights(&locate_file(file));
            print_insights(file, &insights, cli.format)?;
        }
        Some(Command::Forecast {
            ref file,
            ref history,
        }) => {
            apply_history_args(&mut config, history)?;
            let repo = open_repository(&history.repo)?;
            let evaluator = Evaluator::new(&repo, config);

            let forecast = evaluator.forecast_decay(&locate_file(file));
            match cli.format {
                OutputFormat::Json => {
                    let json = serde_json::json!({
                        "filePath": file.display().to_string(),
                        "decayForecast": forecast,
                    });
                    println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
                }
                OutputFormat::Markdown => {
                    println!("`{}`: **{:.0}%** decay forecast", file.display(), forecast * 100.0);
                }
                OutputFormat::Text => println!("{forecast:.3}"),
            }
        }
        Some(Command::Rank {
            ref history,
            max_files,
            fail_on,
        }) => {
            apply_history_args(&mut config, history)?;
            let max_files = max_files.unwrap_or(config.evaluation.max_files);
            let repo = open_repository(&history.repo)?;
            let evaluator = Evaluator::new(&repo, config);

            let is_tty = std::io::stderr().is_terminal();
            let spinner = if is_tty {
                let pb = indicatif::ProgressBar::new_spinner();
                if let Ok(style) =
                    indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                {
                    pb.set_style(style);
                }
                pb.set_message("Discovering files...");
                pb.enable_steady_tick(std::time::Duration::from_millis(120));
                Some(pb)
            } else {
                None
            };

            let ranking = evaluator
                .evaluate_repository_with(max_files, |path| {
                    if let Some(pb) = &spinner {
                        pb.set_message(format!("Evaluating {}", path.display()));
                    }
                })
                .inspect_err(|_e| {
                    if let Some(pb) = &spinner {
                        pb.finish_with_message("Failed");
                    }
                })?;

            if let Some(pb) = spinner {
                pb.finish_and_clear();
            }

            print_ranking(&ranking, cli.format, cli.verbose, use_color)?;

            if let Some(threshold) = fail_on {
                let exposed = ranking
                    .evaluations
                    .iter()
                    .any(|e| e.exposure_level.meets_threshold(threshold));
                if exposed {
                    std::process::exit(1);
                }
            }
        }
        Some(Command::Init) => {
            let path = Path::new(".tideline.toml");
            if path.exists() {
                miette::bail!(".tideline.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .tideline.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "tideline", &mut std::io::stdout());
        }
    }

    Ok(())
}
