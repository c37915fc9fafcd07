use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use token_fixer::config::{resolve, ConfigSource, FixerConfig};
use token_fixer::runner::{check_path, collect_files, fix_path, RunOptions};
use token_fixer::FixOutcome;

#[derive(Parser)]
#[command(name = "token-fixer")]
#[command(about = "Find and automatically fix whitespace violations in text files", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to a token-fixer.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fix violations in place
    Fix {
        /// Files or directories to fix
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,

        /// Do not colorize the diff
        #[arg(long)]
        no_color: bool,
    },

    /// Report violations without changing files
    Check {
        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Fix {
            paths,
            dry_run,
            diff,
            no_color,
        } => cmd_fix(&config, &paths, dry_run, diff, !no_color),
        Commands::Check { paths } => cmd_check(&config, &paths),
    });

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if verbose >= 2 {
        builder.filter_level(log::LevelFilter::Debug);
    } else if verbose == 1 {
        builder.filter_level(log::LevelFilter::Info);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Resolve the config: explicit flag, then the nearest token-fixer.toml, then defaults.
fn load_config(explicit: Option<&Path>) -> Result<FixerConfig> {
    let cwd = std::env::current_dir().context("reading working directory")?;
    let loaded = resolve(explicit, &cwd)?;
    if let ConfigSource::Discovered(path) = &loaded.source {
        log::info!("using config {}", path.display());
    }
    Ok(loaded.config)
}

/// Returns `Ok(false)` when any file failed to converge.
fn cmd_fix(
    config: &FixerConfig,
    paths: &[PathBuf],
    dry_run: bool,
    show_diff: bool,
    color: bool,
) -> Result<bool> {
    if !color {
        colored::control::set_override(false);
    }

    let files = collect_files(paths, &config.files.extensions)?;
    let options = RunOptions {
        write: !dry_run,
        diff: show_diff,
        color,
    };

    if dry_run {
        println!("{}", "[DRY RUN - no files will be written]".cyan());
    }

    let mut total_fixed = 0;
    let mut total_clean = 0;
    let mut total_failed = 0;

    for file in &files {
        let report = fix_path(file, config, options)
            .with_context(|| format!("fixing {}", file.display()))?;

        match report.outcome {
            FixOutcome::NothingToFix => {
                println!("{} {}: clean", "⊙".yellow(), file.display());
                total_clean += 1;
            }
            FixOutcome::Converged { passes } => {
                let verb = if dry_run { "Would fix" } else { "Fixed" };
                println!(
                    "{} {}: {} {} violations in {} {}",
                    "✓".green(),
                    file.display(),
                    verb,
                    report.fixable.saturating_sub(report.remaining),
                    passes,
                    if passes == 1 { "pass" } else { "passes" }
                );
                total_fixed += 1;
            }
            FixOutcome::Failed { passes } => {
                eprintln!(
                    "{} {}: failed to fix after {} passes, {} violations remain",
                    "✗".red(),
                    file.display(),
                    passes,
                    report.remaining
                );
                total_failed += 1;
            }
        }

        if let Some(diff) = &report.diff {
            println!("{diff}");
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} fixed", format!("{}", total_fixed).green());
    println!("  {} clean", format!("{}", total_clean).yellow());
    println!("  {} failed", format!("{}", total_failed).red());

    Ok(total_failed == 0)
}

/// Returns `Ok(false)` when any violation was found.
fn cmd_check(config: &FixerConfig, paths: &[PathBuf]) -> Result<bool> {
    let files = collect_files(paths, &config.files.extensions)?;
    let mut total = 0;

    for file in &files {
        let reports = check_path(file, config)?;
        for report in &reports {
            println!(
                "{}:{}: {} {}",
                file.display(),
                report.violation.line,
                format!("[{}]", report.code).dimmed(),
                report.violation.message
            );
        }
        total += reports.len();
    }

    println!();
    if total == 0 {
        println!("{}", "No fixable violations found".green());
    } else {
        println!(
            "{} fixable violations in {} files",
            format!("{}", total).red(),
            files.len()
        );
    }

    Ok(total == 0)
}
