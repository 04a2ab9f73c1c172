//! The upstream client (component C2): talks to the GitHub Copilot backend over one shared
//! HTTP session, reading the bearer and base URL from the credential manager on every call.

mod error;
mod http_client;
mod models_cache;

use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use credentials::{CredentialManager, COPILOT_HEADERS};
use futures_util::{stream, Stream, StreamExt, TryStreamExt};
use models_cache::ModelsCache;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

pub use error::Error;

/// A lazy, forward-only sequence of complete SSE lines, each terminated by a single `\n`,
/// with a final empty `\n` on normal termination. See component C2's streaming contract.
pub type LineStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Talks to `api.githubcopilot.com` (or whatever dynamic base URL the credential manager
/// has learned). Cheap to share: wrap in `Arc` and clone the `Arc` per request.
pub struct UpstreamClient {
    http: reqwest::Client,
    credentials: Arc<CredentialManager>,
    models_cache: ModelsCache,
}

impl UpstreamClient {
    /// Builds a client backed by `credentials` for bearer/base-URL resolution.
    pub fn new(credentials: Arc<CredentialManager>) -> Self {
        Self {
            http: http_client::build(),
            credentials,
            models_cache: ModelsCache::new(),
        }
    }

    /// `GET {base}/models`, cached in memory for 300 seconds.
    pub async fn list_models(&self) -> Result<Vec<serde_json::Value>, Error> {
        if let Some(cached) = self.models_cache.get().await {
            return Ok(cached);
        }

        let (bearer, base) = self.credentials.ensure_bearer().await?;
        let url = format!("{base}/models");

        let response = self
            .request(reqwest::Method::GET, &url, &bearer, &[])
            .send()
            .await
            .map_err(|err| Error::Request("GET /models", err))?;

        let response = raise_for_status(response).await?;
        let body: serde_json::Value = response.json().await.map_err(Error::Decode)?;

        let raw = body
            .get("data")
            .or_else(|| body.get("models"))
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        let models: Vec<serde_json::Value> = raw
            .into_iter()
            .filter(|model| {
                model
                    .get("model_picker_enabled")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true)
            })
            .collect();

        self.models_cache.store(models.clone()).await;
        Ok(models)
    }

    /// `POST {base}/chat/completions`, non-streaming.
    pub async fn chat_completions(&self, body: serde_json::Value) -> Result<serde_json::Value, Error> {
        let (bearer, base) = self.credentials.ensure_bearer().await?;
        let url = format!("{base}/chat/completions");

        let response = self
            .request(reqwest::Method::POST, &url, &bearer, &[])
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Request("POST /chat/completions", err))?;

        let response = raise_for_status(response).await?;
        response.json().await.map_err(Error::Decode)
    }

    /// `POST {base}/chat/completions` with `stream: true`, yielding raw SSE lines.
    pub async fn chat_completions_stream(&self, mut body: serde_json::Value) -> Result<LineStream, Error> {
        let (bearer, base) = self.credentials.ensure_bearer().await?;
        let url = format!("{base}/chat/completions");
        body["stream"] = serde_json::Value::Bool(true);

        let response = self
            .request(reqwest::Method::POST, &url, &bearer, &[])
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Request("POST /chat/completions", err))?;

        let response = raise_for_status(response).await?;
        Ok(line_stream(response))
    }

    /// `POST {base}/responses`, non-streaming. `extra_headers` carries the vision/initiator
    /// shaping computed by the HTTP surface from the request body.
    pub async fn responses(
        &self,
        body: serde_json::Value,
        extra_headers: &[(&str, String)],
    ) -> Result<serde_json::Value, Error> {
        let (bearer, base) = self.credentials.ensure_bearer().await?;
        let url = format!("{base}/responses");

        let response = self
            .request(reqwest::Method::POST, &url, &bearer, extra_headers)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Request("POST /responses", err))?;

        let response = raise_for_status(response).await?;
        response.json().await.map_err(Error::Decode)
    }

    /// `POST {base}/responses` with `stream: true`, yielding raw SSE lines.
    pub async fn responses_stream(
        &self,
        mut body: serde_json::Value,
        extra_headers: &[(&str, String)],
    ) -> Result<LineStream, Error> {
        let (bearer, base) = self.credentials.ensure_bearer().await?;
        let url = format!("{base}/responses");
        body["stream"] = serde_json::Value::Bool(true);

        let response = self
            .request(reqwest::Method::POST, &url, &bearer, extra_headers)
            .json(&body)
            .send()
            .await
            .map_err(|err| Error::Request("POST /responses", err))?;

        let response = raise_for_status(response).await?;
        Ok(line_stream(response))
    }

    fn request(
        &self,
        method: reqwest::Method,
        url: &str,
        bearer: &str,
        extra_headers: &[(&str, String)],
    ) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {bearer}"))
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        for (name, value) in COPILOT_HEADERS {
            builder = builder.header(*name, *value);
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, value.as_str());
        }

        builder
    }
}

async fn raise_for_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Prefers the upstream's own `{"error": {"message": ...}}` envelope when the body parses as
/// JSON; otherwise falls back to the first 500 bytes of the raw body.
fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(message) = value.get("error").and_then(|error| error.get("message")).and_then(|m| m.as_str()) {
            return message.to_owned();
        }
        if let Some(message) = value.get("message").and_then(|m| m.as_str()) {
            return message.to_owned();
        }
    }

    truncate_chars(body, 500)
}

fn truncate_chars(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s[..end].to_owned()
}

/// Adapts a response body into the byte-line contract described by component C2: one `\n`
/// terminated chunk per non-empty upstream line, followed by a single trailing `\n` once the
/// upstream closes the connection.
fn line_stream(response: reqwest::Response) -> LineStream {
    let byte_stream = response
        .bytes_stream()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err));
    let reader = StreamReader::new(byte_stream);
    let lines = FramedRead::new(reader, LinesCodec::new());

    let body = lines.filter_map(|line| async move {
        match line {
            Ok(line) if line.is_empty() => None,
            Ok(line) => Some(Ok(Bytes::from(line + "\n"))),
            Err(err) => Some(Err(Error::Stream(err.into()))),
        }
    });

    let trailer = stream::once(async { Ok(Bytes::from_static(b"\n")) });
    Box::pin(body.chain(trailer))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_stream_type_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<LineStream>();
    }

    #[test]
    fn extract_error_message_prefers_nested_error_envelope() {
        let body = r#"{"error": {"message": "model not found", "type": "invalid_request_error"}}"#;
        assert_eq!(extract_error_message(body), "model not found");
    }

    #[test]
    fn extract_error_message_falls_back_to_top_level_message() {
        let body = r#"{"message": "rate limited"}"#;
        assert_eq!(extract_error_message(body), "rate limited");
    }

    #[test]
    fn extract_error_message_truncates_non_json_body_to_500_bytes() {
        let body = "x".repeat(1000);
        let message = extract_error_message(&body);
        assert_eq!(message.len(), 500);
    }

    #[test]
    fn extract_error_message_passes_through_short_non_json_body() {
        assert_eq!(extract_error_message("service unavailable"), "service unavailable");
    }
}
