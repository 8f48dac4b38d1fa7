use std::sync::Arc;

use axum::extract::{Path, Query, State};
use tracing::debug;

use super::super::dto::ListQuery;
use super::super::envelope::{ApiError, ApiSuccess};
use super::super::state::ServerState;
use crate::domain::tool::Package;
use crate::infrastructure::model::ModelProvider;

#[utoipa::path(
    get,
    path = "/api/packages",
    tag = "packages",
    params(ListQuery),
    responses(
        (status = 200, description = "Envelope with a page of packages (`data: Package[]`)")
    )
)]
pub async fn list_packages_handler<P: ModelProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Query(query): Query<ListQuery>,
) -> ApiSuccess<Vec<Package>> {
    debug!(page = query.page, limit = query.limit, "Serving /api/packages request");
    ApiSuccess::paginated(state.catalog().page(query.page, query.limit))
}

#[utoipa::path(
    get,
    path = "/api/packages/{name}",
    tag = "packages",
    params(("name" = String, Path, description = "Package name, scoped names included")),
    responses(
        (status = 200, description = "Envelope with the package (`data: Package`)"),
        (status = 404, description = "Unknown package", body = super::super::envelope::ApiFailure)
    )
)]
pub async fn get_package_handler<P: ModelProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Path(name): Path<String>,
) -> Result<ApiSuccess<Package>, ApiError> {
    let name = name.trim_matches('/');
    state
        .catalog()
        .package(name)
        .cloned()
        .map(ApiSuccess::new)
        .ok_or_else(|| ApiError::not_found(format!("Package '{name}' was not found")))
}
