use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use fixwright::config::{load_from_path, load_or_default, EngineConfig};
use fixwright::verify::{load_cases, Verifier};
use fixwright::ts::{validate_edit, validate_syntax};
use fixwright::{atomic_write, FixEngine, Selection, SourceModel};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "fixwright")]
#[command(about = "Rule-driven code fixes for C#", long_about = None)]
#[command(version)]
struct Cli {
    /// Engine configuration (defaults to ./fixwright.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report diagnostics without changing files
    Check {
        /// Files or directories to scan for .cs sources
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply fixes until no fixable diagnostic remains
    Fix {
        /// Files or directories to scan for .cs sources
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Apply every fix with this equivalence key instead of the first per diagnostic
        #[arg(short, long)]
        key: Option<String>,

        /// Dry run - show what would be changed without modifying files
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(short, long)]
        diff: bool,
    },

    /// Run before/after fixture cases
    Verify {
        /// TOML fixture files with [[cases]]
        #[arg(required = true)]
        fixtures: Vec<PathBuf>,
    },

    /// List rules and the fixes registered for them
    Rules,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check { paths, json } => cmd_check(&config, &paths, json),
        Commands::Fix {
            paths,
            key,
            dry_run,
            diff,
        } => cmd_fix(&config, &paths, key, dry_run, diff),
        Commands::Verify { fixtures } => cmd_verify(&config, &fixtures),
        Commands::Rules => cmd_rules(&config),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "fixwright=debug",
        _ => "fixwright=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Explicit `--config`, else `./fixwright.toml` if it exists, else defaults.
fn load_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    if let Some(path) = explicit {
        return Ok(load_from_path(path)?);
    }
    Ok(load_or_default(Path::new("."))?)
}

/// Helper: Collect `.cs` files under `paths`, sorted and deduplicated.
fn discover_sources(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.exists() {
            anyhow::bail!("path does not exist: {}", root.display());
        }
        for entry in WalkDir::new(root) {
            let entry = entry?;
            if entry.file_type().is_file()
                && entry.path().extension().and_then(|s| s.to_str()) == Some("cs")
            {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Helper: Show unified diff between original and fixed content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (fixed)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);
    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}

fn print_diagnostics(engine: &FixEngine, file: &Path, model: &SourceModel) {
    let lines = model.line_index();
    for diagnostic in model.diagnostics() {
        let (line, col) = lines.line_col(diagnostic.span.start);
        let severity = match diagnostic.severity {
            fixwright::Severity::Error => diagnostic.severity.to_string().red().bold(),
            fixwright::Severity::Warning => diagnostic.severity.to_string().yellow().bold(),
            fixwright::Severity::Info => diagnostic.severity.to_string().cyan().bold(),
        };
        let fixable = if engine.catalog().providers_for(&diagnostic.rule_id).is_empty() {
            String::new()
        } else {
            format!(" {}", "(fixable)".dimmed())
        };
        println!(
            "{}:{}:{}: {}[{}] {}{}",
            file.display(),
            line,
            col,
            severity,
            diagnostic.rule_id,
            diagnostic.message,
            fixable
        );
    }
}

fn cmd_check(config: &EngineConfig, paths: &[PathBuf], json: bool) -> Result<()> {
    let engine = FixEngine::from_config(config)?;
    let files = discover_sources(paths)?;

    let mut total = 0;
    let mut reports = Vec::new();
    for file in &files {
        let text = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;
        if let Err(e) = validate_syntax(&text) {
            tracing::warn!(file = %file.display(), error = %e, "source has syntax errors");
        }
        let model = engine.diagnose(&text)?;
        total += model.diagnostics().len();

        if json {
            reports.push(serde_json::json!({
                "path": file.display().to_string(),
                "diagnostics": model.diagnostics(),
            }));
        } else {
            print_diagnostics(&engine, file, &model);
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    } else {
        println!();
        println!(
            "{} diagnostic(s) in {} file(s)",
            format!("{}", total).bold(),
            files.len()
        );
    }

    if total > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_fix(
    config: &EngineConfig,
    paths: &[PathBuf],
    key: Option<String>,
    dry_run: bool,
    show_diff: bool,
) -> Result<()> {
    let engine = FixEngine::from_config(config)?;
    let selection = key.map_or(Selection::First, Selection::Key);
    let files = discover_sources(paths)?;

    if dry_run {
        println!("{}", "[DRY RUN - showing what would be fixed]".cyan());
    }

    let mut total_changed = 0;
    let mut total_applied = 0;
    let mut total_remaining = 0;
    let mut total_failed = 0;

    for file in &files {
        let original = fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", file.display()))?;

        let report = match engine.fix(&original, &selection) {
            Ok(report) => report,
            Err(e) => {
                eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                total_failed += 1;
                continue;
            }
        };

        total_remaining += report.remaining.len();
        if !report.changed() {
            continue;
        }
        if let Err(e) = validate_edit(&original, &report.source) {
            eprintln!(
                "{} {}: fixes introduced a syntax error, leaving file unchanged ({})",
                "✗".red(),
                file.display(),
                e
            );
            total_failed += 1;
            continue;
        }

        total_changed += 1;
        total_applied += report.applied.len();
        let verb = if dry_run { "Would fix" } else { "Fixed" };
        println!(
            "{} {}: {} ({} fix(es), {} pass(es))",
            "✓".green(),
            file.display(),
            verb,
            report.applied.len(),
            report.iterations
        );
        for dropped in &report.dropped {
            println!("  {} deferred conflicting fix '{}'", "⊙".yellow(), dropped);
        }

        if show_diff {
            display_diff(file, &original, &report.source);
        }
        if !dry_run {
            atomic_write(file, report.source.as_bytes())
                .with_context(|| format!("failed to write {}", file.display()))?;
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} file(s) changed", format!("{}", total_changed).green());
    println!("  {} fix(es) applied", format!("{}", total_applied).green());
    println!(
        "  {} diagnostic(s) remaining",
        format!("{}", total_remaining).yellow()
    );
    println!("  {} failed", format!("{}", total_failed).red());

    if total_failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_verify(config: &EngineConfig, fixtures: &[PathBuf]) -> Result<()> {
    let verifier = Verifier::from_config(config)?;

    let mut passed = 0;
    let mut failed = 0;
    for fixture in fixtures {
        let cases = load_cases(fixture)?;
        println!("Verifying {} ({} case(s))...", fixture.display(), cases.len());

        let results = verifier.verify_many(&cases);
        for (case, result) in cases.iter().zip(results) {
            match result {
                Ok(report) => {
                    println!(
                        "{} {}: {} diagnostic(s), {} fix(es)",
                        "✓".green(),
                        case.name,
                        report.diagnostics,
                        report.applied.len()
                    );
                    passed += 1;
                }
                Err(e) => {
                    eprintln!("{} {}: FAILED", "✗".red(), case.name);
                    for line in e.to_string().lines() {
                        eprintln!("  {}", line);
                    }
                    failed += 1;
                }
            }
        }
    }

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} passed", format!("{}", passed).green());
    println!("  {} failed", format!("{}", failed).red());

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_rules(config: &EngineConfig) -> Result<()> {
    let engine = FixEngine::from_config(config)?;
    for id in engine.rules().rule_ids() {
        let providers: Vec<&str> = engine
            .catalog()
            .providers_for(id)
            .into_iter()
            .map(|p| p.name())
            .collect();
        if providers.is_empty() {
            println!("{}", id.bold());
        } else {
            println!("{}  {}", id.bold(), providers.join(", ").dimmed());
        }
    }
    Ok(())
}
