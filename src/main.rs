use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use travel_planner::server::{router, AppState};
use travel_planner::{
    AppConfig, GeminiClient, ItineraryCrew, PageRenderer, SerpApiClient, TripPlanner,
};

#[derive(Debug, Parser)]
#[command(name = "travel-planner", about = "AI-powered travel planner web app")]
struct Args {
    /// Configuration file (defaults to config/default and config/local)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, overriding the configured one
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "travel_planner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("Failed to load config")?;

    let flights = SerpApiClient::from_config(&config.serpapi)?;
    let model = GeminiClient::from_config(&config.gemini)?;
    let planner = TripPlanner::new(
        Arc::new(flights),
        Arc::new(ItineraryCrew::new(Arc::new(model))),
    );

    let state = AppState {
        planner,
        renderer: PageRenderer::new()?,
        currency: config.serpapi.currency.clone(),
    };

    let bind = args.bind.unwrap_or(config.server.bind);
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("Listening on {}", bind);

    axum::serve(listener, router(Arc::new(state))).await?;
    Ok(())
}
