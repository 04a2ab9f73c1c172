//! Route handlers for the six HTTP surfaces (§6).

use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use futures_util::StreamExt as _;
use serde_json::{json, Value};

use crate::error::{ApiError, Envelope};
use crate::state::AppState;

/// `POST /v1/chat/completions` — OpenAI dialect, pass-through to upstream.
pub async fn chat_completions(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let body: Value = serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(err.to_string()))?;
    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    if streaming {
        let lines = state.upstream.chat_completions_stream(body).await?;
        Ok(sse_response(lines.map(|item| item.map_err(ApiError::from))))
    } else {
        let response = state.upstream.chat_completions(body).await?;
        Ok(Json(response).into_response())
    }
}

/// `POST /v1/messages` — Anthropic dialect, translated in both directions.
pub async fn messages(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, Response> {
    handle_messages(state, body).await.map_err(|err| err.into_response_for(Envelope::Anthropic))
}

async fn handle_messages(state: Arc<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request = protocol::parse_anthropic_request(&body)?;
    let streaming = request.stream.unwrap_or(false);
    let model = protocol::resolve_model(&request.model);
    let openai_request = protocol::anthropic_request_to_openai(request);

    if streaming {
        let body = serde_json::to_value(&openai_request).map_err(protocol::Error::from)?;
        let mut lines = state.upstream.chat_completions_stream(body).await?;

        let stream = async_stream::stream! {
            let mut translator = protocol::StreamTranslator::new(model);
            while let Some(chunk) = lines.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        log::warn!("upstream stream line failed: {err}");
                        break;
                    }
                };
                let line = String::from_utf8_lossy(&chunk);
                for event in protocol::process_stream_line(&mut translator, &line) {
                    yield Ok::<_, std::io::Error>(Bytes::from(event.to_sse()));
                }
            }
        };

        Ok(sse_raw_response(stream))
    } else {
        let body = serde_json::to_value(&openai_request).map_err(protocol::Error::from)?;
        let raw = state.upstream.chat_completions(body).await?;
        let response: protocol::openai::ChatCompletionResponse =
            serde_json::from_value(raw).map_err(protocol::Error::from)?;
        let anthropic_response = protocol::openai_response_to_anthropic(response, model);
        Ok(Json(anthropic_response).into_response())
    }
}

/// `POST /v1/responses` — OpenAI Responses dialect; body pre-processing plus stream id repair.
pub async fn responses(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ApiError> {
    let mut body: Value = serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest(err.to_string()))?;

    protocol::strip_service_tier(&mut body);
    protocol::rewrite_apply_patch_tool(&mut body);

    let mut extra_headers = vec![("X-Initiator".to_owned(), protocol::initiator(&body).to_owned())];
    if protocol::has_vision_input(&body) {
        extra_headers.push(("copilot-vision-request".to_owned(), "true".to_owned()));
    }
    let extra_headers: Vec<(&str, String)> = extra_headers.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();

    let streaming = body.get("stream").and_then(Value::as_bool).unwrap_or(false);

    if streaming {
        let mut lines = state.upstream.responses_stream(body, &extra_headers).await?;

        let stream = async_stream::stream! {
            let mut rewriter = protocol::ResponsesStreamRewriter::new();
            while let Some(chunk) = lines.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        log::warn!("upstream stream line failed: {err}");
                        break;
                    }
                };
                let line = String::from_utf8_lossy(&chunk);
                let rewritten = rewriter.rewrite_line(&line);
                yield Ok::<_, std::io::Error>(Bytes::from(rewritten));
            }
        };

        Ok(sse_raw_response(stream))
    } else {
        let response = state.upstream.responses(body, &extra_headers).await?;
        Ok(Json(response).into_response())
    }
}

/// `GET /v1/models` — OpenAI-style list, derived from the cached upstream model list.
pub async fn models(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let models = state.upstream.list_models().await?;
    Ok(Json(json!({ "object": "list", "data": models })))
}

/// `GET /health`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = state.credentials.status().await;
    Json(json!({
        "status": "ok",
        "version": state.version,
        "authenticated": status.authenticated,
        "token_valid": status.copilot_token_valid,
        "token_expires_in": status.expires_in,
    }))
}

/// `GET /` — trivial liveness banner.
pub async fn root() -> &'static str {
    "copilotx proxy is running\n"
}

fn sse_response<S>(stream: S) -> Response
where
    S: futures_util::Stream<Item = Result<Bytes, ApiError>> + Send + 'static,
{
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .expect("static headers are always valid")
}

fn sse_raw_response<S>(stream: S) -> Response
where
    S: futures_util::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static,
{
    Response::builder()
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(stream))
        .expect("static headers are always valid")
}
