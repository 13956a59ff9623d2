mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use eduportal::config::ApiConfig;
use eduportal::confirm::{AutoConfirm, Confirmer};
use eduportal::error::AppError;
use eduportal::gateway::HttpSchoolApi;
use eduportal::notify::NotificationChannel;
use eduportal::state::AppState;

use crate::cli::{Cli, StdinConfirmer};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "eduportal=warn".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Cli::parse();

    let (outcome, notifications) = match load_config(&args) {
        Ok(config) => {
            let notifications = Arc::new(NotificationChannel::new(config.notify_duration));
            let outcome = match build_state(&args, &config, Arc::clone(&notifications)) {
                Ok(state) => {
                    // views report their own failures
                    cli::run(args.command, state).await;
                    Ok(())
                }
                Err(e) => Err(e),
            };
            (outcome, Some(notifications))
        }
        Err(e) => (Err(e), None),
    };

    if let Some(notification) = notifications.and_then(|channel| channel.current()) {
        println!("{}", cli::render_notification(&notification));
    }

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("command failed: {}", e);
            eprintln!("Something went wrong: {}", e.user_message());
            eprintln!("Re-run the command to retry, or run `eduportal home` to start over.");
            ExitCode::FAILURE
        }
    }
}

fn load_config(args: &Cli) -> Result<ApiConfig, AppError> {
    let config = ApiConfig::new_from_env()?;
    match &args.api_url {
        Some(url) => config.with_base_url(url),
        None => Ok(config),
    }
}

fn build_state(
    args: &Cli,
    config: &ApiConfig,
    notifications: Arc<NotificationChannel>,
) -> Result<AppState, AppError> {
    info!("using records API at {}", config.base_url);
    let api = HttpSchoolApi::new(config)?;
    let confirmer: Arc<dyn Confirmer> = if args.yes {
        Arc::new(AutoConfirm(true))
    } else {
        Arc::new(StdinConfirmer)
    };

    Ok(AppState::new(Arc::new(api), notifications, confirmer))
}
