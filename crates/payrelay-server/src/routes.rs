use actix_governor::governor::middleware::NoOpMiddleware;
use actix_governor::{Governor, GovernorConfig, PeerIpKeyExtractor};
use actix_web::http::header;
use actix_web::{get, web, HttpRequest, HttpResponse};
use payrelay::SIGNATURE_HEADER;

use crate::error::ApiError;
use crate::metrics;
use crate::realtime;
use crate::state::AppState;

/// Per-IP limiter applied to client-facing routes.
pub type RateLimit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Register every relay route without rate limiting.
pub fn configure(cfg: &mut web::ServiceConfig, callback_path: &str) {
    configure_callback(cfg, callback_path);
    configure_client(cfg);
}

/// Register every relay route, limiting only the client-facing ones.
///
/// The callback route is never throttled. It must be registered before the
/// catch-all scope.
pub fn configure_limited(cfg: &mut web::ServiceConfig, callback_path: &str, limit: &RateLimit) {
    configure_callback(cfg, callback_path);
    cfg.service(
        web::scope("")
            .wrap(Governor::new(limit))
            .configure(configure_client),
    );
}

/// Provider callback route. The path is configurable because it must match
/// what was registered with the payment provider.
pub fn configure_callback(cfg: &mut web::ServiceConfig, callback_path: &str) {
    cfg.service(web::resource(callback_path).route(web::post().to(payment_callback)));
}

/// Browser-facing routes: status polling, the push socket, health and metrics.
pub fn configure_client(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(metrics_endpoint)
        .service(payment_status)
        .service(realtime::ws);
}

fn header_str<'a>(req: &'a HttpRequest, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}

/// Provider server-to-server callback.
pub async fn payment_callback(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let content_type = header_str(&req, header::CONTENT_TYPE.as_str());
    let signature = header_str(&req, SIGNATURE_HEADER);

    match state.callbacks.handle(content_type, &body, signature) {
        Ok(outcome) => {
            metrics::CALLBACKS.with_label_values(&["accepted"]).inc();
            metrics::STATUS_PUSHES
                .with_label_values(&[outcome.notify.as_str()])
                .inc();
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "success": true,
                "message": "payment notification received",
            })))
        }
        Err(e) => {
            metrics::CALLBACKS.with_label_values(&[e.code()]).inc();
            tracing::warn!(
                error = %e,
                content_type = content_type.unwrap_or("<none>"),
                x_verify = signature.unwrap_or("<none>"),
                body_len = body.len(),
                "payment callback rejected"
            );
            Err(e.into())
        }
    }
}

/// Polling fallback for clients that missed the push.
#[get("/payment-status/{transaction_id}")]
pub async fn payment_status(
    path: web::Path<String>,
    state: web::Data<AppState>,
) -> HttpResponse {
    metrics::STATUS_QUERIES.inc();
    let status = state.store.get(&path);
    HttpResponse::Ok().json(serde_json::json!({ "status": status }))
}

#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "payrelay",
        "trackedTransactions": state.store.len(),
        "liveChannels": state.registry.len(),
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    match &state.metrics_token {
        Some(token) => {
            let authorized = header_str(&req, header::AUTHORIZATION.as_str())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| payrelay::signature::constant_time_eq(t.as_bytes(), token))
                .unwrap_or(false);

            if !authorized {
                return HttpResponse::Unauthorized().json(serde_json::json!({
                    "error": "unauthorized",
                    "message": "Valid Bearer token required for /metrics"
                }));
            }
        }
        None if !state.public_metrics => {
            return HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": "Set METRICS_TOKEN or PAYRELAY_PUBLIC_METRICS=true to access /metrics"
            }));
        }
        None => {}
    }
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}
