use esgpulse::cli::commands::{CliArgs, Commands};
use esgpulse::cli::handlers::{
    base_config, handle_analyze, handle_batch, handle_config, handle_health, handle_news,
    handle_predict, handle_serve,
};
use esgpulse::util::logging::{init_logging, parse_level, LoggingConfig};
use esgpulse::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();
    init_logging(logging_from_args(&args));

    debug!("esgpulse v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let config = base_config(&args);

    let exit_code = match &args.command {
        Commands::Analyze(analyze_args) => handle_analyze(analyze_args, config).await,
        Commands::Batch(batch_args) => handle_batch(batch_args, config).await,
        Commands::Predict(predict_args) => handle_predict(predict_args, &config),
        Commands::News(news_args) => handle_news(news_args, config).await,
        Commands::Serve(serve_args) => handle_serve(serve_args, config).await,
        Commands::Health(health_args) => handle_health(health_args, &config),
        Commands::Config(config_args) => handle_config(config_args, &config),
    };

    std::process::exit(exit_code);
}

fn logging_from_args(args: &CliArgs) -> LoggingConfig {
    let mut config = LoggingConfig::from_env();

    config.level = if let Some(level_str) = &args.log_level {
        parse_level(level_str)
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else if let Ok(level_str) = env::var("ESGPULSE_LOG_LEVEL") {
        parse_level(&level_str)
    } else {
        Level::INFO
    };

    config
}
