//! Consultdesk - team diagnostics for people-management consulting
//!
//! A CLI and HTTP service over the consulting backend: org charts, DISC and
//! climate summaries, executive reports and client-access provisioning.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, rejected request, etc.)
//!   2 - No data yet (no climate responses, no DISC evaluations, no employees)

mod analysis;
mod backend;
mod cli;
mod config;
mod error;
mod models;
mod report;
mod server;
mod services;

use anyhow::{Context, Result};
use backend::Backend;
use cli::{Args, Command};
use config::{Config, DEFAULT_CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use report::ExportOptions;
use services::provisioning::{provision_client_access, AccessRequest};
use services::reports as views;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

const EXIT_NO_DATA: i32 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if let Command::InitConfig { force } = args.command {
        return handle_init_config(force);
    }

    // Load configuration before logging so the file can turn on verbose output
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, config.general.verbose);

    info!("Consultdesk v{}", env!("CARGO_PKG_VERSION"));
    debug!("Command: {:?}", args.command);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Command failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle init-config: generate a default .consultdesk.toml.
fn handle_init_config(force: bool) -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);

    if path.exists() && !force {
        eprintln!(
            "⚠️  {} already exists. Remove it first, edit it manually, or pass --force.",
            DEFAULT_CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", DEFAULT_CONFIG_FILE);
    println!(
        "   Keys can also come from SUPABASE_URL, SUPABASE_ANON_KEY and SUPABASE_SERVICE_ROLE_KEY."
    );
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch a subcommand. Returns the process exit code.
async fn run(args: Args, config: Config) -> Result<i32> {
    let backend = backend::connect(&config.backend, args.snapshot.as_deref())?;

    match args.command {
        Command::Serve { .. } => {
            println!("🚀 Starting server on {}", config.server.bind);
            server::start_server(&config, backend).await?;
            Ok(0)
        }
        Command::OrgChart { ref project, json } => {
            run_org_chart(backend.as_ref(), project, json, args.quiet).await
        }
        Command::Disc { ref project, json } => {
            run_disc(backend.as_ref(), project, json, args.quiet).await
        }
        Command::Climate { ref project, json } => {
            run_climate(backend.as_ref(), project, json, args.quiet).await
        }
        Command::Report {
            ref project,
            ref output,
            ..
        } => run_report(backend.as_ref(), &config, project, output.clone(), args.quiet).await,
        Command::Portfolio { json } => run_portfolio(backend.as_ref(), json, args.quiet).await,
        Command::Provision {
            ref email,
            ref password,
            ref name,
            ref company,
        } => {
            let request = AccessRequest {
                email: email.clone(),
                password: password.clone(),
                name: name.clone(),
                company_id: company.clone(),
            };
            run_provision(backend, request).await
        }
        // Handled before logging starts
        Command::InitConfig { .. } => Ok(0),
    }
}

/// Spinner shown while waiting on the backend.
fn spinner(quiet: bool, message: &str) -> Option<ProgressBar> {
    if quiet {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}

fn finish(pb: Option<ProgressBar>) {
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }
}

async fn run_org_chart(
    backend: &dyn Backend,
    project: &str,
    json: bool,
    quiet: bool,
) -> Result<i32> {
    let pb = spinner(quiet, "Fetching employees...");
    let chart = views::project_org_chart(backend, project).await;
    finish(pb);
    let chart = chart?;

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else if chart.is_empty() && chart.unplaced.is_empty() {
        println!("ℹ️  No active employees for project {}.", project);
    } else {
        println!("🏢 Org chart ({} employees, depth {}):\n", chart.len(), chart.depth());
        print!("{}", analysis::orgchart::render_text(&chart));
        if !chart.unplaced.is_empty() {
            println!(
                "\n⚠️  {} employee(s) caught in a supervisor cycle: {}",
                chart.unplaced.len(),
                chart.unplaced.join(", ")
            );
        }
    }

    if chart.is_empty() && chart.unplaced.is_empty() {
        return Ok(EXIT_NO_DATA);
    }
    Ok(0)
}

async fn run_disc(backend: &dyn Backend, project: &str, json: bool, quiet: bool) -> Result<i32> {
    let pb = spinner(quiet, "Fetching DISC data...");
    let overview = views::project_disc(backend, project).await;
    finish(pb);

    let Some(overview) = overview? else {
        println!("ℹ️  No DISC evaluations for project {} yet.", project);
        return Ok(EXIT_NO_DATA);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
        return Ok(0);
    }

    println!("🧭 DISC summary:");
    if let Some(ref team) = overview.team {
        println!("   Evaluated employees: {}", team.evaluated);
        for share in &team.distribution {
            println!(
                "   - {} {}: {} ({}%)",
                share.letter,
                share.letter.trait_name(),
                share.count,
                share.percent
            );
        }
        println!("   Predominant: {}", team.predominant.trait_name());
        println!("   Average adherence: {}%", team.average_adherence);
    }
    if let Some(ref traits) = overview.traits {
        println!(
            "   Evaluation averages ({}): {}",
            traits.evaluations,
            traits.headline()
        );
    }

    Ok(0)
}

async fn run_climate(backend: &dyn Backend, project: &str, json: bool, quiet: bool) -> Result<i32> {
    let pb = spinner(quiet, "Fetching climate responses...");
    let summary = views::project_climate(backend, project).await;
    finish(pb);

    let Some(summary) = summary? else {
        println!("ℹ️  Climate survey not yet launched for project {}.", project);
        return Ok(EXIT_NO_DATA);
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(0);
    }

    println!(
        "🌡️  Climate index: {}/100 ({} responses)",
        summary.overall_rounded(),
        summary.responses
    );
    for dimension in &summary.dimensions {
        println!(
            "   - {:<16} {:>3}  {}",
            dimension.label,
            dimension.rounded(),
            dimension.status
        );
    }

    Ok(0)
}

async fn run_portfolio(backend: &dyn Backend, json: bool, quiet: bool) -> Result<i32> {
    let pb = spinner(quiet, "Fetching portfolio...");
    let metrics = views::portfolio(backend).await;
    finish(pb);
    let metrics = metrics?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        println!("📊 Portfolio:");
        println!("   Reports available: {}", metrics.projects);
        println!("   HR diagnoses:      {}", metrics.diagnoses);
        match metrics.climate_mean {
            Some(mean) => println!("   Climate mean:      {:.1}/10", mean),
            None => println!("   Climate mean:      no responses yet"),
        }
        for project in &metrics.recent {
            println!("   - {} ({})", project.id, project.status);
        }
    }

    if metrics.projects == 0 {
        return Ok(EXIT_NO_DATA);
    }
    Ok(0)
}

async fn run_report(
    backend: &dyn Backend,
    config: &Config,
    project: &str,
    output: Option<PathBuf>,
    quiet: bool,
) -> Result<i32> {
    let format = config.report.format;

    let pb = spinner(quiet, "Assembling report...");
    let assembled = views::assemble(backend, project, &config.report.consultancy).await;
    finish(pb);
    let assembled = assembled?;

    println!("📝 Generating {:?} report...", format);
    let options = ExportOptions::from(&config.report);
    let content = report::render(&assembled, format, &options)?;

    let path = output.unwrap_or_else(|| {
        PathBuf::from(&config.general.output).with_extension(format.extension())
    });
    report::write_report(&content, &path)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;

    println!("\n📊 Report Summary:");
    println!("   Company: {}", assembled.company.trade_name);
    println!("   Executive index: {}/100", assembled.executive_index);
    match assembled.climate {
        Some(ref climate) => println!("   Climate index: {}/100", climate.overall_rounded()),
        None => println!("   Climate index: survey not launched"),
    }
    println!("\n✅ Report saved to: {}", path.display());

    Ok(0)
}

async fn run_provision(backend: Arc<dyn Backend>, request: AccessRequest) -> Result<i32> {
    println!("🔐 Creating access for {}...", request.email);

    let access = provision_client_access(backend.as_ref(), &request).await?;

    println!(
        "✅ Access created: user {} linked to company {}",
        access.auth_user_id, access.company_id
    );
    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so problems go straight to stderr.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("⚠️  Failed to load {}: {:#}. Using defaults.", DEFAULT_CONFIG_FILE, e);
            Ok(Config::default())
        }
    }
}
