use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, warn};

use super::super::dto::{ErrorResponse, ExecuteToolRequest};
use super::super::rate_limit::{REMAINING_HEADER, client_key};
use super::super::state::ServerState;
use crate::application::agent::ExecutionEvent;
use crate::application::definition::create_tool_definition;
use crate::infrastructure::model::ModelProvider;

const EVENT_BUFFER: usize = 64;

/// Splits `package[/export]`; a scoped package (`@scope/name`) spans two
/// segments.
pub fn parse_target(target: &str) -> Option<(String, Option<String>)> {
    let segments: Vec<&str> = target
        .trim_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    let (package, rest) = match segments.as_slice() {
        [scope, name, rest @ ..] if scope.starts_with('@') => (format!("{scope}/{name}"), rest),
        [scope, ..] if scope.starts_with('@') => return None,
        [name, rest @ ..] => (name.to_string(), rest),
        [] => return None,
    };
    match rest {
        [] => Some((package, None)),
        [export] => Some((package, Some(export.to_string()))),
        _ => None,
    }
}

#[utoipa::path(
    post,
    path = "/api/tools/execute/{target}",
    tag = "tools",
    params(("target" = String, Path, description = "`package[/export]`, e.g. `@toolpipe/text-chunk/textChunk`")),
    request_body = ExecuteToolRequest,
    responses(
        (status = 200, description = "`text/event-stream` with `chunk`, `tokens`, `complete` and `error` events"),
        (status = 400, description = "Empty prompt or malformed target", body = ErrorResponse),
        (status = 404, description = "Unknown package or export", body = ErrorResponse),
        (status = 429, description = "Execution limit reached", body = ErrorResponse),
        (status = 500, description = "Tool definition could not be built", body = ErrorResponse)
    )
)]
pub async fn execute_handler<P: ModelProvider + 'static>(
    State(state): State<Arc<ServerState<P>>>,
    Path(target): Path<String>,
    headers: HeaderMap,
    body: Result<Json<ExecuteToolRequest>, JsonRejection>,
) -> Response {
    let Some((package_name, export_name)) = parse_target(&target) else {
        return failure(StatusCode::BAD_REQUEST, None, format!("Invalid tool path '{target}'"));
    };

    let client = client_key(&headers);
    let decision = state.rate_limiter().check(&client).await;
    if !decision.allowed {
        warn!(client = client.as_str(), "Rejecting execution: rate limit reached");
        let retry = decision.reset_in.as_secs().max(1);
        return failure(
            StatusCode::TOO_MANY_REQUESTS,
            Some(decision.remaining),
            format!("Rate limit exceeded. Try again in {retry}s."),
        );
    }
    let remaining = Some(decision.remaining);

    let prompt = match body {
        Ok(Json(request)) => request.prompt,
        Err(rejection) => {
            return failure(StatusCode::BAD_REQUEST, remaining, rejection.body_text());
        }
    };
    if prompt.trim().is_empty() {
        error!("Rejecting execution request due to empty prompt");
        return failure(StatusCode::BAD_REQUEST, remaining, "Prompt is required");
    }

    let Some((package, tool)) = state
        .catalog()
        .find(&package_name, export_name.as_deref())
    else {
        return failure(
            StatusCode::NOT_FOUND,
            remaining,
            format!(
                "Tool '{}' was not found in package '{package_name}'",
                export_name.as_deref().unwrap_or("default")
            ),
        );
    };

    let definition = match create_tool_definition(
        package,
        tool,
        state.executor(),
        state.options().clone(),
    ) {
        Ok(definition) => definition,
        Err(err) => {
            error!(package = package_name.as_str(), error = %err, "Failed to build tool definition");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, remaining, err.user_message());
        }
    };

    info!(
        package = package_name.as_str(),
        export = tool.export_name.as_str(),
        client = client.as_str(),
        "Starting tool execution"
    );

    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let task_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(err) = task_state
            .runner()
            .run_streaming(&prompt, &definition, tx)
            .await
        {
            warn!(tool = definition.name(), error = %err, "Execution ended with an error");
        }
    });

    let stream = ReceiverStream::new(rx).map(|event: ExecutionEvent| {
        Ok::<_, Infallible>(
            Event::default()
                .event(event.name())
                .data(event.data().to_string()),
        )
    });
    let sse = Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    );
    (rate_headers(remaining), sse).into_response()
}

fn failure(status: StatusCode, remaining: Option<u32>, message: impl Into<String>) -> Response {
    (
        status,
        rate_headers(remaining),
        Json(ErrorResponse::new(message)),
    )
        .into_response()
}

fn rate_headers(remaining: Option<u32>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Some(remaining) = remaining {
        headers.insert(
            HeaderName::from_static(REMAINING_HEADER),
            HeaderValue::from(remaining),
        );
    }
    headers
}
