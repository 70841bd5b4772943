mod api_types;
mod cleanup_task;
mod error;
mod game_session_manager;
mod id_generator;
mod server_config;
mod web_server;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use clap::Parser;
use common::config::ConfigManager;
use common::stats::{FileStatsStore, StatsStore};
use common::{log, logger};

use cleanup_task::CleanupTask;
use game_session_manager::GameSessionManager;
use server_config::{CLEANUP_CHECK_INTERVAL, ServerConfig};
use web_server::{WebServerState, run_web_server};

#[derive(Parser)]
#[command(name = "tictactoe_server")]
struct Args {
    #[arg(long, default_value = "tictactoe_server.yaml")]
    config: String,

    #[arg(long)]
    use_log_prefix: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let prefix = if args.use_log_prefix {
        Some("Server".to_string())
    } else {
        None
    };
    logger::init_logger(prefix);

    let config_manager = ConfigManager::<_, ServerConfig>::from_yaml_file(args.config.as_str());
    let config = config_manager.get_config()?;
    log!("Loaded config from {}: {:?}", args.config, config);

    let stats_store: Arc<dyn StatsStore> = Arc::new(FileStatsStore::new(config.stats_file.as_str()));
    let session_manager = GameSessionManager::new(stats_store.clone(), config.bot_move_delay());

    let cleanup_task = CleanupTask::new(
        session_manager.clone(),
        CLEANUP_CHECK_INTERVAL,
        config.session_timeout(),
    );
    tokio::spawn(async move {
        cleanup_task.run().await;
    });

    let state = WebServerState {
        session_manager,
        stats_store,
    };

    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        log!("Shutdown signal received");
    };

    run_web_server(state, &config.bind_address, shutdown_signal).await?;

    log!("Server shut down gracefully");

    Ok(())
}
