use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::docs::ApiDoc;
use super::error::ServerError;
use super::rate_limit::REMAINING_HEADER;
use super::routes;
use super::state::ServerState;
use crate::infrastructure::model::ModelProvider;

/// Builds the application router; an empty `cors_origins` allows any origin.
pub fn build_router<P>(state: Arc<ServerState<P>>, cors_origins: &[String]) -> Router
where
    P: ModelProvider + 'static,
{
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health::health_handler))
        .route("/api/tools", get(routes::tools::list_tools_handler::<P>))
        .route(
            "/api/tools/execute/{*target}",
            post(routes::execute::execute_handler::<P>),
        )
        .route("/api/packages", get(routes::packages::list_packages_handler::<P>))
        .route(
            "/api/packages/{*name}",
            get(routes::packages::get_package_handler::<P>),
        )
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

pub async fn serve<P>(state: ServerState<P>, addr: SocketAddr, cors_origins: &[String]) -> Result<(), ServerError>
where
    P: ModelProvider + 'static,
{
    info!(%addr, "Binding REST server");
    let app = build_router(Arc::new(state), cors_origins);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    info!(%addr, "REST server ready to accept connections");

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(ServerError::Serve)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([HeaderName::from_static(REMAINING_HEADER)]);

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = origin.as_str(), "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if allowed.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(allowed)
    }
}
