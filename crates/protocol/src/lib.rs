//! The protocol translator (C3) and Responses stream rewriter (C4): pure transforms between
//! the Anthropic Messages dialect and the OpenAI Chat Completions dialect spoken by the
//! upstream, plus the identifier repair pass applied to Responses-API streams.

pub mod anthropic;
mod error;
mod model_map;
pub mod openai;
mod request;
mod response;
mod responses_request;
mod responses_stream;
mod stream;
mod tools;

pub use error::Error;
pub use model_map::resolve as resolve_model;
pub use request::translate as anthropic_request_to_openai;
pub use response::translate as openai_response_to_anthropic;
pub use responses_request::{has_vision_input, initiator, rewrite_apply_patch_tool, strip_service_tier};
pub use responses_stream::Rewriter as ResponsesStreamRewriter;
pub use stream::{process_line as process_stream_line, Translator as StreamTranslator};

/// Parses a raw request body as an Anthropic Messages request.
pub fn parse_anthropic_request(body: &[u8]) -> Result<anthropic::MessagesRequest, Error> {
    Ok(serde_json::from_slice(body)?)
}

/// Parses a raw response body as an OpenAI Chat Completions response.
pub fn parse_openai_response(body: &[u8]) -> Result<openai::ChatCompletionResponse, Error> {
    Ok(serde_json::from_slice(body)?)
}
