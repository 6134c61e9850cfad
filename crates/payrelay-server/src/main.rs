use actix_governor::GovernorConfigBuilder;
use actix_web::{web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use payrelay_server::config::RelayConfig;
use payrelay_server::cors::build_cors;
use payrelay_server::routes;
use payrelay_server::state::AppState;

const BODY_LIMIT: usize = 65_536;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match RelayConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            tracing::error!(
                "PAYRELAY_SALT_KEY must be set to the salt key issued by the payment provider"
            );
            std::process::exit(1);
        }
    };

    tracing::debug!(?config, "loaded configuration");

    let state = web::Data::new(AppState::from_config(&config));
    let port = config.port;
    let callback_path = config.callback_path.clone();
    let cors_origins = config.allowed_origins.clone();

    tracing::info!("payrelay listening on {}:{port}", config.bind_addr);
    tracing::info!("Signature path: {}", config.signature_path);
    tracing::info!("Salt index: {}", config.salt_index);
    tracing::info!(
        "Rate limit: {} req/min per IP (callback route exempt)",
        config.rate_limit_rpm
    );
    tracing::info!("  POST http://localhost:{port}{callback_path}");
    tracing::info!("  GET  http://localhost:{port}/payment-status/{{transactionId}}");
    tracing::info!("  GET  ws://localhost:{port}/ws");

    let governor_conf = GovernorConfigBuilder::default()
        .requests_per_minute(config.rate_limit_rpm)
        .finish()
        .expect("failed to build rate limiter config");

    HttpServer::new(move || {
        App::new()
            .wrap(build_cors(&cors_origins))
            .app_data(state.clone())
            .app_data(web::PayloadConfig::default().limit(BODY_LIMIT))
            .app_data(web::JsonConfig::default().limit(BODY_LIMIT))
            .configure(|cfg| routes::configure_limited(cfg, &callback_path, &governor_conf))
    })
    .bind((config.bind_addr.as_str(), port))?
    .run()
    .await
}
