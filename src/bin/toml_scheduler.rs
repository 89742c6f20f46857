use agent_scheduler::config::toml_config::TomlConfig;
use agent_scheduler::domain::ports::ConfigProvider;
use agent_scheduler::utils::{logger, validation::Validate};
use agent_scheduler::{produce_report, run_scheduler, ReportOutput};
use anyhow::Context;
use clap::Parser;

#[derive(Parser)]
#[command(name = "toml-scheduler")]
#[command(about = "Agent scheduler driven by a TOML configuration file")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "scheduler.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 載入 TOML 配置
    let config = TomlConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load config file '{}'", args.config))?;

    logger::init_logger(args.verbose || config.verbose(), config.json_logs());
    tracing::info!("🚀 Starting TOML-based scheduler");
    tracing::info!("📁 Configuration loaded from: {}", args.config);

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config)?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let summary = match run_scheduler(config.clone(), monitor_enabled).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(
                "❌ Scheduler run failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    match produce_report(&summary, &config).context("Failed to produce report")? {
        ReportOutput::Printed(text) => println!("{}", text),
        ReportOutput::Written(path) => println!("📊 Dashboard written to: {}", path.display()),
        ReportOutput::Skipped => {}
    }

    Ok(())
}

fn display_config_summary(config: &TomlConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Scheduler: {}", config.name());
    if let Some(description) = &config.scheduler.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {}", config.input_path());
    println!("  Storage: {} ({})", config.storage_kind(), config.output_dir());
    println!("  Report: {}", config.report_format());

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

fn perform_dry_run(config: &TomlConfig) -> anyhow::Result<()> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📥 Input:");
    let input = std::path::Path::new(config.input_path());
    if input.exists() {
        let metadata = std::fs::metadata(input)
            .with_context(|| format!("Cannot inspect {}", input.display()))?;
        println!("  ✅ {} ({} bytes)", input.display(), metadata.len());
    } else {
        println!("  ⚠️ {} does not exist; a real run would abort", input.display());
    }

    println!();
    println!("⚙️ Allocation:");
    println!("  Utilization: {}", config.utilization());
    if config.capacity() > 0 {
        println!("  Capacity: {} agents per hour", config.capacity());
    } else {
        println!("  Capacity: unlimited");
    }
    println!(
        "  Ingestion: batches of {} rows, {} workers",
        config.batch_size(),
        config.ingest_workers()
    );

    println!();
    println!("💾 Output:");
    println!("  Format: {}", config.report_format());
    if config.skip_output() {
        println!("  Report output is skipped");
    } else if config.report_format() == agent_scheduler::config::ReportFormat::Html {
        println!("  Dashboard path: {}", config.report_path());
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
