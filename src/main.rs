use anyhow::Context;
use clap::Parser;
use geo2csv::config::{CliArgs, USAGE_MESSAGE};
use geo2csv::utils::{logger, validation::Validate};
use geo2csv::{location_from_os_args, QueryProcessor, Settings};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);

    let location = match location_from_os_args(&args.location) {
        Ok(location) => location,
        Err(e) => {
            tracing::debug!("No usable location: {}", e);
            println!("{}", USAGE_MESSAGE);
            return Ok(());
        }
    };

    tracing::info!("🚀 Looking up \"{}\"", location);

    let settings = Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    if args.verbose {
        tracing::debug!("Settings: {:?}", settings);
    }

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let processor = match QueryProcessor::from_config(&settings) {
        Ok(processor) => processor,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    match processor.process_until(&location, shutdown_signal()).await {
        Ok(output_path) => {
            tracing::info!("✅ Lookup completed successfully!");
            println!("📁 Output saved to: {}", output_path.display());
        }
        Err(e) => {
            tracing::error!("❌ Lookup failed: {}", e);
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    }

    Ok(())
}

/// Completes on Ctrl-C. Never completes if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
