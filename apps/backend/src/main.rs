use actix_web::{web, App, HttpServer};
use arena_backend::config::ArenaConfig;
use arena_backend::infra::retention::{spawn_retention, SWEEP_INTERVAL};
use arena_backend::infra::state::build_state;
use arena_backend::middleware::{cors_middleware, RequestTrace, StructuredLogger, TraceSpan};
use arena_backend::routes;
use tracing::{error, info};

mod telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    let config = match ArenaConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    let (host, port) = (config.host.clone(), config.port);
    let retention = config.retention_policy();
    let cors_origins = config.cors_allowed_origins.clone();

    let app_state = match build_state().with_config(config).build().await {
        Ok(state) => state,
        Err(e) => {
            error!(error = %e, "Failed to build application state");
            std::process::exit(1);
        }
    };
    info!(store = %app_state.config.store, "Store ready");

    let sweeper = spawn_retention(
        app_state.store.clone(),
        app_state.clock.clone(),
        retention,
        SWEEP_INTERVAL,
    );
    let registry = app_state.websocket_registry();
    let data = web::Data::new(app_state);

    info!(%host, port, "Starting arena backend");
    let server = HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware(&cors_origins))
            .wrap(StructuredLogger)
            .wrap(TraceSpan)
            .wrap(RequestTrace)
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();
    let result = tokio::select! {
        res = server => res,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown requested, closing sockets");
            registry.shutdown_all();
            handle.stop(true).await;
            Ok(())
        }
    };
    sweeper.abort();
    result
}
