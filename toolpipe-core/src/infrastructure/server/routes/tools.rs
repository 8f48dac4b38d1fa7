use std::sync::Arc;

use axum::extract::{Query, State};
use tracing::debug;

use super::super::dto::{ListQuery, ToolSummary};
use super::super::envelope::ApiSuccess;
use super::super::state::ServerState;
use crate::application::catalog::paginate;
use crate::infrastructure::model::ModelProvider;

#[utoipa::path(
    get,
    path = "/api/tools",
    tag = "tools",
    params(ListQuery),
    responses(
        (status = 200, description = "Envelope with a page of tool summaries (`data: ToolSummary[]`)")
    )
)]
pub async fn list_tools_handler<P: ModelProvider>(
    State(state): State<Arc<ServerState<P>>>,
    Query(query): Query<ListQuery>,
) -> ApiSuccess<Vec<ToolSummary>> {
    let summaries: Vec<ToolSummary> = state
        .catalog()
        .tools()
        .into_iter()
        .map(|(package, tool)| ToolSummary::new(package, tool))
        .collect();
    debug!(
        tool_count = summaries.len(),
        page = query.page,
        "Serving /api/tools request"
    );
    ApiSuccess::paginated(paginate(&summaries, query.page, query.limit))
}
