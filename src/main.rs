use clap::{Parser, Subcommand};
use crosspub::types::{AggregateStatus, PublishOutcome, PublishRequest};
use crosspub::{Config, PublishCoordinator, SessionStore};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "crosspub", about = "Publish a video to multiple platforms through a browser")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Remote-debug address of an already-running browser
    #[arg(long, default_value = "127.0.0.1:9222")]
    debug_address: String,

    /// Run launched browsers headless
    #[arg(long)]
    headless: bool,

    /// Skip real browser interaction and report synthetic results
    #[arg(long)]
    simulate: bool,

    /// Write page snapshots for failed workflows into this directory
    #[arg(long)]
    diagnostics_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Publish a video with metadata to the given platforms
    Publish {
        #[arg(long)]
        video: PathBuf,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Comma-separated tag list
        #[arg(long, default_value = "")]
        tags: String,
        /// Comma-separated platform names
        #[arg(long)]
        platforms: String,
    },
    /// Report whether a stored session for the platform is still fresh
    CheckLogin {
        platform: String,
        /// Override the platform's own expiry window
        #[arg(long)]
        max_age_hours: Option<i64>,
    },
    /// Open the platform's page, wait for a manual login and store it
    SaveLogin { platform: String },
    /// Remove the stored session for the platform
    Logout { platform: String },
    /// Probe the remote-debug address for a reachable browser
    CheckBrowser,
    /// List supported platforms
    Platforms,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::default();
    config.browser.debug_address = cli.debug_address.clone();
    config.browser.headless = cli.headless;
    config.simulate_only = cli.simulate;
    config.store.diagnostics_dir = cli.diagnostics_dir.clone();

    match cli.command {
        Command::Publish {
            video,
            title,
            description,
            tags,
            platforms,
        } => {
            let request = PublishRequest::new(video, title)
                .with_description(description)
                .with_tags(split_list(&tags))
                .with_platforms(split_list(&platforms));

            if request.target_platforms.is_empty() {
                error!("no platforms given; see `crosspub platforms`");
                std::process::exit(2);
            }

            let mut coordinator = PublishCoordinator::with_chrome(config);
            let aggregate = coordinator.publish(&request).await?;

            for result in &aggregate.per_platform {
                match result.outcome {
                    PublishOutcome::Confirmed => {
                        info!(
                            "✅ {}: published{}",
                            result.platform,
                            result
                                .remote_url
                                .as_deref()
                                .map(|u| format!(" ({})", u))
                                .unwrap_or_default()
                        );
                    }
                    PublishOutcome::Unconfirmed => {
                        warn!("⚠️ {}: submitted, not confirmed: {}", result.platform, result.message);
                    }
                    PublishOutcome::Failed => {
                        error!("❌ {}: {}", result.platform, result.message);
                    }
                }
            }
            info!(
                "{}/{} platforms succeeded ({:?})",
                aggregate.success_count, aggregate.total_count, aggregate.status
            );
            if aggregate.status == AggregateStatus::AllFailed {
                std::process::exit(1);
            }
        }
        Command::CheckLogin {
            platform,
            max_age_hours,
        } => {
            let max_age_hours = max_age_hours.unwrap_or_else(|| {
                crosspub::platforms::by_name(&platform)
                    .map(|spec| spec.session_expiry_hours)
                    .unwrap_or(config.store.session_expiry_hours)
            });
            let store = SessionStore::from_config(&config.store.session_dir);
            if store.is_valid(&platform, max_age_hours).await {
                info!("{}: stored session is fresh", platform);
            } else {
                warn!("{}: no fresh session stored, a manual login will be needed", platform);
            }
        }
        Command::SaveLogin { platform } => {
            let mut coordinator = PublishCoordinator::with_chrome(config);
            match coordinator.capture_login(&platform).await {
                Ok(()) => info!("{}: login captured and stored", platform),
                Err(e) => {
                    error!("{}: login capture failed: {}", platform, e);
                    std::process::exit(1);
                }
            }
        }
        Command::Logout { platform } => {
            let store = SessionStore::from_config(&config.store.session_dir);
            store.clear(&platform).await?;
            info!("{}: stored session removed", platform);
        }
        Command::CheckBrowser => {
            match crosspub::ChromeBrowser::probe_debug_endpoint(&config.browser.debug_address).await
            {
                Ok(endpoint) => info!(
                    "{} reachable at {}",
                    endpoint.browser_version, config.browser.debug_address
                ),
                Err(e) => {
                    error!(
                        "no browser reachable at {}: {}",
                        config.browser.debug_address, e
                    );
                    std::process::exit(1);
                }
            }
        }
        Command::Platforms => {
            for name in crosspub::platforms::supported_names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
