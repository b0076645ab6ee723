use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedwatch::app::AppContext;
use feedwatch::cli::{commands, Cli, Commands};
use feedwatch::config::Config;
use feedwatch::daemon::{Daemon, DaemonConfig};
use feedwatch::domain::ScrapeSelectors;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Run => {
            commands::run(&ctx).await?;
        }
        Commands::Daemon {
            interval,
            no_initial_run,
        } => {
            let mut daemon_config =
                DaemonConfig::from_settings(&ctx.config.daemon).map_err(anyhow::Error::msg)?;
            if let Some(interval) = interval {
                daemon_config.interval_secs =
                    DaemonConfig::parse_interval(&interval).map_err(anyhow::Error::msg)?;
            }
            if no_initial_run {
                daemon_config.run_on_start = false;
            }
            Daemon::new(Arc::new(ctx), daemon_config).run().await?;
        }
        Commands::Add(args) => {
            commands::add_source(&ctx, args.into()).await?;
        }
        Commands::Update(args) => {
            let id = args.id.clone();
            commands::update_source(&ctx, &id, args.into()).await?;
        }
        Commands::Remove { id } => {
            commands::remove_source(&ctx, &id).await?;
        }
        Commands::List { json } => {
            commands::list_sources(&ctx, json).await?;
        }
        Commands::Preview {
            url,
            title_selector,
            link_selector,
            description_selector,
            limit,
        } => {
            let mut selectors = ScrapeSelectors::new(title_selector, link_selector);
            selectors.description_selector = description_selector;
            commands::preview(&ctx, &url, selectors, limit).await?;
        }
        Commands::Purge => {
            commands::purge(&ctx).await?;
        }
    }

    Ok(())
}
