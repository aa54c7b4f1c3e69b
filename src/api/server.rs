use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use crate::api::handlers::{add_favorite_handler, create_user_handler, get_user_handler,
                           list_favorites_handler, remove_favorite_handler,
                           update_preferences_handler};
use crate::context::domain::AppContext;


fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE]);

    match allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Warning: ALLOWED_ORIGIN inválido ({allowed_origin}): {e}");
            layer
        }
    }
}


pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/api/favorites", get(list_favorites_handler).post(add_favorite_handler))
        .route("/api/favorites/{city_id}", delete(remove_favorite_handler))
        .route("/api/users", post(create_user_handler))
        .route("/api/users/{user_id}", get(get_user_handler))
        .route("/api/users/{user_id}/preferences", put(update_preferences_handler))
        .layer(cors_layer(&ctx.system.allowed_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}


/// Levanta la API HTTP hasta recibir Ctrl+C.
pub async fn start_server(ctx: AppContext) -> std::io::Result<()> {
    let addr = format!("{}:{}", ctx.system.http_host, ctx.system.http_port);
    let listener = TcpListener::bind(&addr).await?;

    info!("Info: API HTTP escuchando en http://{addr}");

    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_err() {
                warn!("Warning: no se pudo escuchar Ctrl+C");
            }
            info!("Info: apagando API HTTP");
        })
        .await
}
