use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use genocheck_core::{CheckStatus, Config, MetadataCatalog, Report, Severity};
use genocheck_engine::{Check, CheckRegistry, CheckRunner, DatabaseTarget, PreviousDatabase, RunnerOptions};
use genocheck_session::connector_for_url;

const DEFAULT_CONFIG: &str = "genocheck.toml";

/// genocheck - integrity checks for genome annotation databases
#[derive(Parser)]
#[command(name = "genocheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: genocheck.toml, or $GENOCHECK_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the selected groups against every configured database
    Run {
        /// Group or check name to run (repeatable; overrides the config)
        #[arg(short, long)]
        group: Vec<String>,

        /// Output file for report.json
        #[arg(short, long, default_value = "report.json")]
        output: PathBuf,

        /// Also output markdown report
        #[arg(short, long)]
        markdown: Option<PathBuf>,

        /// Lowest severity printed (ALL, CORRECT, INFO, WARNING, PROBLEM, NONE)
        #[arg(short, long)]
        level: Option<Severity>,
    },

    /// List registered checks
    List {
        /// Only checks in these groups
        #[arg(short, long)]
        group: Vec<String>,
    },

    /// List every group with its number of checks
    Groups,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Connection strings may come from a .env file
    dotenvy::dotenv().ok();

    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref(), cli.verbose)?;

    match cli.command {
        Commands::Run { group, output, markdown, level } => {
            run_command(config, group, &output, markdown.as_deref(), level, cli.verbose).await
        }
        Commands::List { group } => list_command(&config, &group),
        Commands::Groups => groups_command(&config),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn load_config(explicit: Option<&Path>, verbose: bool) -> Result<Config> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os("GENOCHECK_CONFIG").map(PathBuf::from))
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));

    match path {
        Some(path) => {
            if verbose {
                eprintln!("{} {}", "Loading config from:".cyan(), path.display());
            }
            Config::from_file(&path).with_context(|| format!("Failed to load {}", path.display()))
        }
        None => {
            if verbose {
                eprintln!("{}", "No config file found, using defaults".yellow());
            }
            Ok(Config::default())
        }
    }
}

/// Run command - check every configured database
async fn run_command(
    mut config: Config,
    groups: Vec<String>,
    output: &Path,
    markdown: Option<&Path>,
    level: Option<Severity>,
    verbose: bool,
) -> Result<()> {
    if !groups.is_empty() {
        config.groups = groups;
    }

    let catalog = Arc::new(config.catalog());
    let targets = build_targets(&config, catalog.as_ref())?;
    if targets.is_empty() {
        return Err(anyhow::anyhow!(
            "No databases to check. Add [[databases]] entries with a name and url to {}.",
            DEFAULT_CONFIG
        ));
    }

    let registry = genocheck_checks::registry(&config)?;
    let selection = config.selection();

    if verbose {
        eprintln!(
            "{} {} databases, groups: {}",
            "Checking".cyan(),
            targets.len(),
            config.groups.join(", ")
        );
    }

    let runner = CheckRunner::new(Arc::new(registry), catalog).with_options(RunnerOptions::from_config(&config));
    if runner.plan(&targets, &selection).is_empty() {
        eprintln!("{}", "⚠ No checks apply to the configured databases for these groups".yellow());
    }

    let report = runner.run(&targets, &selection).await.with_metadata(serde_json::json!({
        "groups": config.groups,
        "databases": targets.iter().map(|t| t.identity.name().to_string()).collect::<Vec<_>>(),
    }));

    // Save JSON report
    report
        .save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if verbose {
        eprintln!("{} {}", "Report saved to:".green(), output.display());
    }

    // Save markdown report if requested
    if let Some(md_path) = markdown {
        std::fs::write(md_path, generate_markdown_report(&report))
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
        if verbose {
            eprintln!("{} {}", "Markdown report saved to:".green(), md_path.display());
        }
    }

    print_report_summary(&report, level.unwrap_or(config.output_level));

    if !report.passed() {
        std::process::exit(1);
    }

    Ok(())
}

/// Targets for every configured database that is not only a previous release
fn build_targets(config: &Config, catalog: &dyn MetadataCatalog) -> Result<Vec<DatabaseTarget>> {
    let reference_only: BTreeSet<&str> = config
        .databases
        .iter()
        .filter_map(|db| db.previous.as_deref())
        .collect();

    let mut targets = Vec::new();
    for db in &config.databases {
        if reference_only.contains(db.name.as_str()) {
            tracing::debug!(database = %db.name, "previous release, not checked itself");
            continue;
        }

        let identity = db.resolve(catalog)?;
        let connector = connector_for_url(&db.url, &config.project_root)
            .with_context(|| format!("Database {} has an unusable url", db.name))?;
        let mut target = DatabaseTarget::new(identity, connector);

        if let Some(previous_name) = &db.previous {
            let previous = config
                .database(previous_name)
                .ok_or_else(|| anyhow::anyhow!("Database {} refers to unknown previous database {}", db.name, previous_name))?;
            let connector = connector_for_url(&previous.url, &config.project_root)
                .with_context(|| format!("Database {} has an unusable url", previous.name))?;
            target = target.with_previous(PreviousDatabase::new(previous.resolve(catalog)?, connector));
        }

        targets.push(target);
    }

    Ok(targets)
}

/// List command - registered checks
fn list_command(config: &Config, groups: &[String]) -> Result<()> {
    let registry = genocheck_checks::registry(config)?;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Registered Checks".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    for check in listed_checks(&registry, groups) {
        let metadata = check.metadata();
        let teams: Vec<_> = metadata.teams().iter().map(|t| t.as_str()).collect();
        let check_groups: Vec<_> = metadata
            .groups()
            .iter()
            .filter(|g| g.as_str() != metadata.name())
            .map(String::as_str)
            .collect();

        println!("{} [{}]", metadata.name().green().bold(), metadata.priority());
        if !metadata.description().is_empty() {
            println!("  {}", metadata.description());
        }
        println!("  Groups: {}", check_groups.join(", "));
        if !teams.is_empty() {
            println!("  Teams:  {}", teams.join(", "));
        }
        println!();
    }

    println!("{}", "=".repeat(60).bright_blue());
    Ok(())
}

fn listed_checks<'a>(
    registry: &'a CheckRegistry,
    groups: &[String],
) -> Vec<&'a Arc<dyn Check>> {
    registry
        .checks()
        .filter(|check| groups.is_empty() || groups.iter().any(|g| check.metadata().in_group(g)))
        .collect()
}

/// Groups command - every group with its size
fn groups_command(config: &Config) -> Result<()> {
    let registry = genocheck_checks::registry(config)?;
    let names: BTreeSet<String> = registry.checks().map(|c| c.metadata().name().to_string()).collect();

    println!("{}", "Groups:".bold());
    for (group, count) in registry.groups() {
        // Every check is implicitly a group of one; list those separately
        if names.contains(&group) {
            continue;
        }
        println!("  {:<28} {} checks", group.cyan(), count);
    }
    println!();
    println!("{} {}", "Checks (usable as groups):".bold(), names.into_iter().collect::<Vec<_>>().join(", "));
    Ok(())
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Problem => "PROBLEM".red().bold(),
        Severity::Warning => "WARNING".yellow().bold(),
        Severity::Info => "INFO".cyan(),
        Severity::Correct => "CORRECT".green(),
        Severity::All | Severity::None => severity.as_str().normal(),
    }
}

/// Print report summary to stdout
fn print_report_summary(report: &Report, level: Severity) {
    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Database Check Report".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    let summary = &report.summary;
    println!("{}", "Checks:".bold());
    println!("  Run:      {}", summary.checks_run);
    println!("  Passed:   {}", summary.checks_passed.to_string().green());
    if summary.checks_failed > 0 {
        println!("  Failed:   {}", summary.checks_failed.to_string().red().bold());
    } else {
        println!("  Failed:   {}", summary.checks_failed.to_string().green());
    }
    if summary.checks_errored > 0 {
        println!("  Errored:  {}", summary.checks_errored.to_string().red().bold());
    } else {
        println!("  Errored:  {}", summary.checks_errored.to_string().green());
    }
    println!();

    println!("{}", "Findings:".bold());
    println!("  Problems: {}", summary.problems);
    println!("  Warnings: {}", summary.warnings);
    println!("  Info:     {}", summary.info);
    println!("  Correct:  {}", summary.correct);
    println!();

    let shown: Vec<_> = report.entries_at_least(level).collect();
    if report.passed() && shown.is_empty() {
        println!("{}", "✓ All checks passed!".green().bold());
    } else if !shown.is_empty() {
        println!("{} (level {} and above)", "Findings:".bold(), level);
        for entry in shown {
            println!(
                "  [{}] {} {} {}: {}",
                severity_label(entry.severity),
                entry.database.name(),
                entry.check.bold(),
                entry.code,
                entry.message
            );
            if let Some(exp) = &entry.expected {
                println!("    Expected: {}", exp);
            }
            if let Some(act) = &entry.actual {
                println!("    Actual:   {}", act);
            }
        }
    }

    let errored: Vec<_> = report.outcomes.iter().filter(|o| o.status == CheckStatus::Error).collect();
    if !errored.is_empty() {
        println!();
        println!("{}", "Could not verify:".red().bold());
        for outcome in errored {
            println!(
                "  {} on {}: {}",
                outcome.check,
                outcome.database.name(),
                outcome.reason.as_deref().unwrap_or("unknown error")
            );
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}

/// Generate markdown report, findings grouped by responsible team
fn generate_markdown_report(report: &Report) -> String {
    let mut md = String::new();

    md.push_str("# Database Check Report\n\n");
    md.push_str(&format!("**Version:** {}\n\n", report.version));
    md.push_str(&format!("**Timestamp:** {}\n\n", report.timestamp));

    let summary = &report.summary;
    md.push_str("## Summary\n\n");
    md.push_str(&format!(
        "- Checks run: {} (passed {}, failed {}, errored {})\n",
        summary.checks_run, summary.checks_passed, summary.checks_failed, summary.checks_errored
    ));
    md.push_str(&format!("- Problems: {}\n", summary.problems));
    md.push_str(&format!("- Warnings: {}\n", summary.warnings));
    md.push_str(&format!("- Info: {}\n", summary.info));
    md.push_str("\n");

    let by_team = report.entries_by_team();
    let mut any = false;

    for (team, entries) in &by_team {
        let findings: Vec<_> = entries.iter().filter(|e| e.severity >= Severity::Warning).collect();
        if findings.is_empty() {
            continue;
        }
        any = true;

        md.push_str(&format!("## Team: {}\n\n", team));
        for entry in findings {
            let marker = if entry.severity == Severity::Problem { "❌" } else { "⚠️" };
            md.push_str(&format!(
                "### {} {} - {} on `{}`\n\n",
                marker,
                entry.check,
                entry.code,
                entry.database.name()
            ));
            md.push_str(&format!("{}\n\n", entry.message));

            if let Some(exp) = &entry.expected {
                md.push_str(&format!("**Expected:** `{}`\n\n", exp));
            }
            if let Some(act) = &entry.actual {
                md.push_str(&format!("**Actual:** `{}`\n\n", act));
            }
        }
    }

    if !any {
        md.push_str("✅ **No problems found!**\n");
    }

    md
}
