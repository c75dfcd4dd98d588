use clap::Parser;
use std::sync::Arc;
use strayfinder_backend::config::{self, CliArgs};
use strayfinder_backend::lane::{self, Lane};
use strayfinder_backend::rng::{self, ThreadRandomSource};
use strayfinder_backend::{api, metrics};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();
    metrics::register_metrics();

    let args = CliArgs::parse();

    let loaded = match config::load(&args.config_file) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!(event = "server exited", code = 1, exception = %e);
            std::process::exit(1);
        }
    };

    let mut game = loaded.game;
    game.spawn_points_are_random = args.randomize_spawn_points;

    let rng: Arc<dyn rng::RandomSource> = Arc::new(ThreadRandomSource);
    let lane = Lane::spawn(game, rng.clone());

    let tick_period = args.tick_period();
    if let Some(period) = tick_period {
        lane::spawn_internal_ticker(lane.clone(), period, rng.clone());
    }

    let state = api::AppState {
        lane,
        rng,
        www_root: args.www_root.clone(),
        frontend_data: Arc::new(loaded.frontend_data),
        tick_endpoint_enabled: tick_period.is_none(),
    };

    let app = api::router(state);

    let port = 8080u16;
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind to {addr}: {e}"));

    tracing::info!(event = "server started", port, address = %addr);

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match result {
        Ok(()) => tracing::info!(event = "server exited", code = 0),
        Err(e) => {
            tracing::error!(event = "server exited", code = 1, exception = %e);
            std::process::exit(1);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
