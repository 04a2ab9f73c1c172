/// Errors raised decoding a request body before translation begins. Once a request is
/// decoded, translation itself is defensive and does not fail (see module docs).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The request body was not valid JSON, or didn't match the expected shape.
    #[error("invalid request body: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
