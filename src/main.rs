use bsky_list_migrator::core::{AccountRole, ConfigProvider};
use bsky_list_migrator::utils::{logger, validation::Validate};
use bsky_list_migrator::{
    CliConfig, MigrateError, MigrationEngine, MigrationRequest, TracingReporter, XrpcClient,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting bsky-list-migrator");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    tracing::warn!(
        "🔑 Use App Passwords only, never the main account password. Consider revoking them after use."
    );

    if let Err(e) = run(&cli).await {
        tracing::error!(
            "❌ Migration process stopped due to errors: {} (stage: {:?})",
            e,
            e.stage()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    Ok(())
}

async fn run(cli: &CliConfig) -> Result<(), MigrateError> {
    // 驗證配置
    let config = cli.resolve()?;
    config.validate()?;
    let request = MigrationRequest::from_config(&config)?;

    let timeout = config.request_timeout();
    let source = XrpcClient::new(config.service_url(AccountRole::Source), timeout)?;
    let destination = XrpcClient::new(config.service_url(AccountRole::Destination), timeout)?;

    let engine = MigrationEngine::new(source, destination).with_pacing(config.pacing());
    let mut reporter = TracingReporter::new();
    let report = engine.run(&request, &mut reporter).await?;

    println!("✅ Migration finished!");
    println!("📋 New list: {}", report.list);
    println!(
        "👥 Members found: {}, added: {}, failed: {}",
        report.outcome.found, report.outcome.added, report.outcome.failed
    );
    if reporter.warnings() > 0 {
        println!("⚠️ {} warning(s), see the log above", reporter.warnings());
    }

    Ok(())
}
