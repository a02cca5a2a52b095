use anyhow::{Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use trip_planner::api::{build_router, AppState};
use trip_planner::cli::CliInterface;
use trip_planner::{App, AppConfig};

const USAGE: &str = "usage: trip-planner [serve | cli | ask <topic...>]";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = AppConfig::from_env()?;

    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("cli") => {
            let app = App::build(config).await?;
            CliInterface::new(app).run().await
        }
        Some("ask") if args.len() > 1 => {
            let app = App::build(config).await?;
            CliInterface::new(app).ask(&args[1..].join(" ")).await
        }
        _ => {
            eprintln!("{}", USAGE);
            std::process::exit(2);
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let bind = config.bind;
    let app = App::build(config).await?;
    let state = AppState::new(app.sessions, app.config.travel.currency)?;
    let router = build_router().with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("cannot bind {}", bind))?;
    info!("trip planner listening on http://{}", bind);

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutting down");
            trigger.cancel();
        }
    });

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}
