use agent_scheduler::utils::error::SchedulerError;
use agent_scheduler::utils::{logger, validation::Validate};
use agent_scheduler::{produce_report, run_scheduler, CliConfig, ReportOutput, RunSummary};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_logger(config.verbose, config.log_json);

    tracing::info!("Starting agent-scheduler CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        exit_with(&e);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let summary = match run_scheduler(config.clone(), monitor_enabled).await {
        Ok(summary) => summary,
        Err(e) => exit_with(&e),
    };

    report_summary(&summary);
    match produce_report(&summary, &config) {
        Ok(output) => print_report(output),
        Err(e) => exit_with(&e),
    }

    Ok(())
}

fn report_summary(summary: &RunSummary) {
    if summary.from_cache {
        tracing::info!("♻️ Schedule loaded from cache");
    } else if let Some(ingest) = &summary.ingest {
        tracing::info!(
            "✅ Processed {} rows ({} skipped, {} dropped)",
            ingest.rows_read,
            ingest.rows_skipped + ingest.rows_rejected,
            ingest.rows_dropped
        );
    }
}

fn print_report(output: ReportOutput) {
    match output {
        ReportOutput::Printed(text) => println!("{}", text),
        ReportOutput::Written(path) => {
            let location = std::fs::canonicalize(&path).unwrap_or(path);
            println!("\n{}", "=".repeat(40));
            println!("Schedule Generation Complete.");
            println!("View dashboard: file://{}", location.display());
            println!("{}", "=".repeat(40));
        }
        ReportOutput::Skipped => {}
    }
}

fn exit_with(e: &SchedulerError) -> ! {
    // 記錄詳細錯誤信息
    tracing::error!(
        "❌ Scheduler run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    // 致命錯誤的退出碼一定不為 0
    std::process::exit(e.exit_code().max(1))
}
