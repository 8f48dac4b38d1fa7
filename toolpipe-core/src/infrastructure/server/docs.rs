use super::dto::{
    ChunkEvent, CompleteEvent, ErrorEvent, ErrorResponse, ExecuteToolRequest, HealthResponse,
    ToolSummary,
};
use super::envelope::{ApiErrorBody, ApiFailure, ErrorCode, Meta, Pagination};
use super::routes;
use crate::domain::tool::{
    HealthStatus, NpmMetadata, Package, Parameter, Returns, TokenBreakdown, Tool, ToolHealth,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::execute::execute_handler,
        routes::tools::list_tools_handler,
        routes::packages::list_packages_handler,
        routes::packages::get_package_handler,
        routes::health::health_handler
    ),
    components(
        schemas(
            ExecuteToolRequest,
            ErrorResponse,
            ChunkEvent,
            CompleteEvent,
            ErrorEvent,
            TokenBreakdown,
            ToolSummary,
            HealthResponse,
            Package,
            Tool,
            Parameter,
            Returns,
            ToolHealth,
            HealthStatus,
            NpmMetadata,
            ApiFailure,
            ApiErrorBody,
            ErrorCode,
            Meta,
            Pagination
        )
    ),
    tags(
        (name = "tools", description = "Tool listing and streamed execution"),
        (name = "packages", description = "Package catalog"),
        (name = "system", description = "Service health")
    )
)]
pub(super) struct ApiDoc;
