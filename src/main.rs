use std::{net::SocketAddr, time::Instant};

use axum::Router;
use newsdesk::config::Config;
use newsdesk::routes::{self, CommentState, GatewayState, NewsState};
use tokio::net::TcpListener;
use tracing::info;

const USAGE: &str = "usage: newsdesk <comments|news|gateway>";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    let service = std::env::args().nth(1).unwrap_or_default();

    let load_start = Instant::now();
    let (app, addr): (Router, SocketAddr) = match service.as_str() {
        "comments" => {
            let state = CommentState::from_config(&config).await?;
            (routes::comment_router(state), config.comments_addr)
        }
        "news" => {
            let state = NewsState::from_config(&config).await?;
            (routes::news_router(state), config.news_addr)
        }
        "gateway" => {
            let state = GatewayState::from_config(&config)?;
            (routes::gateway_router(state), config.gateway_addr)
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };
    info!("{service} service ready in {:?}", load_start.elapsed());

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
