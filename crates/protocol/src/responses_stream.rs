//! Responses-API stream rewriter (C4): repairs inconsistent `item.id`/`item_id` fields.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

const ADDED: &str = "response.output_item.added";
const DONE: &str = "response.output_item.done";

/// Detected quickly by substring match to avoid double-parsing every line; only events that
/// carry an `output_index` are of interest here.
const KNOWN_EVENT_TYPES: &[&str] = &[
    ADDED,
    DONE,
    "response.output_text.delta",
    "response.output_text.done",
    "response.function_call_arguments.delta",
    "response.function_call_arguments.done",
    "response.reasoning_summary_text.delta",
    "response.reasoning_summary_text.done",
    "response.created",
    "response.completed",
    "response.incomplete",
    "response.failed",
    "error",
];

pub struct Rewriter {
    id_for_output_index: HashMap<u64, String>,
    counter: u64,
}

impl Default for Rewriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Rewriter {
    pub fn new() -> Self {
        Self {
            id_for_output_index: HashMap::new(),
            counter: 0,
        }
    }

    /// Rewrites one raw SSE line. Non-`data:` lines, `[DONE]`, and unparseable or
    /// `output_index`-less payloads pass through unchanged.
    pub fn rewrite_line(&mut self, line: &str) -> String {
        let trimmed = line.trim_end_matches(['\r', '\n']);
        let Some(data) = trimmed.strip_prefix("data:") else {
            return line.to_owned();
        };
        let data = data.trim();

        if data == "[DONE]" {
            return line.to_owned();
        }

        let Ok(mut payload) = serde_json::from_str::<Value>(data) else {
            return line.to_owned();
        };

        if !KNOWN_EVENT_TYPES
            .iter()
            .any(|known| payload.get("type").and_then(Value::as_str) == Some(*known))
        {
            return line.to_owned();
        }

        let Some(output_index) = payload.get("output_index").and_then(Value::as_u64) else {
            return line.to_owned();
        };

        let event_type = payload.get("type").and_then(Value::as_str).unwrap_or_default();

        match event_type {
            ADDED => self.rewrite_added(&mut payload, output_index),
            DONE => self.rewrite_done(&mut payload, output_index),
            _ => self.rewrite_item_id(&mut payload, output_index),
        }

        format!("data: {}\n", serde_json::to_string(&payload).expect("Value always serializes"))
    }

    fn rewrite_added(&mut self, payload: &mut Value, output_index: u64) {
        let Some(item) = payload.get_mut("item") else { return };

        let existing = item.get("id").and_then(Value::as_str).filter(|id| !id.is_empty());

        let id = match existing {
            Some(id) => id.to_owned(),
            None => {
                let minted = self.mint_id(output_index);
                if let Some(obj) = item.as_object_mut() {
                    obj.insert("id".to_owned(), Value::String(minted.clone()));
                }
                minted
            }
        };

        self.id_for_output_index.insert(output_index, id);
    }

    fn rewrite_done(&mut self, payload: &mut Value, output_index: u64) {
        let Some(id) = self.id_for_output_index.get(&output_index).cloned() else { return };
        if let Some(item) = payload.get_mut("item").and_then(Value::as_object_mut) {
            item.insert("id".to_owned(), Value::String(id));
        }
    }

    fn rewrite_item_id(&mut self, payload: &mut Value, output_index: u64) {
        let Some(id) = self.id_for_output_index.get(&output_index).cloned() else { return };
        if let Some(obj) = payload.as_object_mut() {
            obj.insert("item_id".to_owned(), Value::String(id));
        }
    }

    fn mint_id(&mut self, output_index: u64) -> String {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros())
            .unwrap_or_default();
        self.counter += 1;
        format!("oi_{output_index}_{micros:x}{:x}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn line(value: serde_json::Value) -> String {
        format!("data: {value}\n")
    }

    #[test]
    fn s6_responses_id_rewrite() {
        let mut rewriter = Rewriter::new();

        let added = rewriter.rewrite_line(&line(json!({
            "type": "response.output_item.added",
            "output_index": 0,
            "item": {"type": "message"}
        })));
        let added_json: Value = serde_json::from_str(added.trim_start_matches("data: ")).unwrap();
        let minted = added_json["item"]["id"].as_str().unwrap().to_owned();
        assert!(minted.starts_with("oi_0_"));

        let delta = rewriter.rewrite_line(&line(json!({
            "type": "response.output_text.delta",
            "output_index": 0
        })));
        let delta_json: Value = serde_json::from_str(delta.trim_start_matches("data: ")).unwrap();
        assert_eq!(delta_json["item_id"], minted);

        let done = rewriter.rewrite_line(&line(json!({
            "type": "response.output_item.done",
            "output_index": 0,
            "item": {"type": "message", "id": "upstream-different"}
        })));
        let done_json: Value = serde_json::from_str(done.trim_start_matches("data: ")).unwrap();
        assert_eq!(done_json["item"]["id"], minted);
    }

    #[test]
    fn done_passthrough_sentinel() {
        let mut rewriter = Rewriter::new();
        assert_eq!(rewriter.rewrite_line("data: [DONE]\n"), "data: [DONE]\n");
    }

    #[test]
    fn malformed_json_passes_through() {
        let mut rewriter = Rewriter::new();
        assert_eq!(rewriter.rewrite_line("data: not json\n"), "data: not json\n");
    }
}
