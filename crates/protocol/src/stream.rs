//! OpenAI SSE → Anthropic SSE streaming translator (§4.3.5).

use std::collections::HashMap;

use crate::anthropic::{BlockDelta, ContentBlockStart, MessageDeltaPayload, MessageStartPayload, StopReason, StreamEvent, StreamUsage};
use crate::openai::ChatCompletionChunk;

struct ToolTracker {
    block_index: usize,
    id: String,
    name: String,
}

/// Per-stream mutable state. One instance drives exactly one upstream SSE stream.
pub struct Translator {
    model: String,
    message_id: String,
    started: bool,
    text_block_index: Option<usize>,
    text_block_started: bool,
    text_block_closed: bool,
    tool_trackers: HashMap<usize, ToolTracker>,
    tool_order: Vec<usize>,
    next_block_index: usize,
    stop_reason: StopReason,
    output_tokens: u32,
}

impl Translator {
    pub fn new(model: String) -> Self {
        Self {
            model,
            message_id: format!("msg_{}", uuid::Uuid::new_v4()),
            started: false,
            text_block_index: None,
            text_block_started: false,
            text_block_closed: false,
            tool_trackers: HashMap::new(),
            tool_order: Vec::new(),
            next_block_index: 0,
            stop_reason: StopReason::EndTurn,
            output_tokens: 0,
        }
    }

    /// Feeds one already-JSON-decoded upstream chunk, returning the Anthropic events it produces.
    pub fn push(&mut self, chunk: &ChatCompletionChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if !self.started {
            self.started = true;
            events.push(StreamEvent::MessageStart {
                message: MessageStartPayload {
                    id: self.message_id.clone(),
                    kind: "message",
                    role: "assistant",
                    model: self.model.clone(),
                    content: Vec::new(),
                    stop_reason: None,
                    stop_sequence: None,
                    usage: StreamUsage::default(),
                },
            });
        }

        for choice in &chunk.choices {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    let index = *self.text_block_index.get_or_insert_with(|| {
                        let index = self.next_block_index;
                        self.next_block_index += 1;
                        index
                    });
                    if !self.text_block_started {
                        self.text_block_started = true;
                        events.push(StreamEvent::ContentBlockStart {
                            index,
                            content_block: ContentBlockStart::Text { text: String::new() },
                        });
                    }
                    events.push(StreamEvent::ContentBlockDelta {
                        index,
                        delta: BlockDelta::TextDelta { text: content.clone() },
                    });
                }
            }

            for fragment in choice.delta.tool_calls.iter().flatten() {
                let is_new = !self.tool_trackers.contains_key(&fragment.index);

                if is_new {
                    // Close the open text block eagerly the moment the first tool-call block
                    // opens, rather than leaving it open until `finish()`.
                    if self.text_block_started && !self.text_block_closed {
                        self.text_block_closed = true;
                        events.push(StreamEvent::ContentBlockStop {
                            index: self.text_block_index.expect("text_block_started implies an index"),
                        });
                    }

                    let block_index = self.next_block_index;
                    self.next_block_index += 1;
                    let id = fragment
                        .id
                        .clone()
                        .unwrap_or_else(|| format!("toolu_{}", uuid::Uuid::new_v4()));
                    let name = fragment
                        .function
                        .as_ref()
                        .and_then(|f| f.name.clone())
                        .unwrap_or_default();

                    self.tool_order.push(fragment.index);
                    events.push(StreamEvent::ContentBlockStart {
                        index: block_index,
                        content_block: ContentBlockStart::ToolUse {
                            id: id.clone(),
                            name: name.clone(),
                            input: serde_json::json!({}),
                        },
                    });
                    self.tool_trackers.insert(
                        fragment.index,
                        ToolTracker {
                            block_index,
                            id,
                            name,
                        },
                    );
                } else if let Some(tracker) = self.tool_trackers.get_mut(&fragment.index) {
                    if let Some(id) = &fragment.id {
                        if !id.is_empty() {
                            tracker.id = id.clone();
                        }
                    }
                    if let Some(name) = fragment.function.as_ref().and_then(|f| f.name.clone()) {
                        if !name.is_empty() {
                            tracker.name = name;
                        }
                    }
                }

                if let Some(arguments) = fragment.function.as_ref().and_then(|f| f.arguments.clone()) {
                    if !arguments.is_empty() {
                        let block_index = self.tool_trackers[&fragment.index].block_index;
                        events.push(StreamEvent::ContentBlockDelta {
                            index: block_index,
                            delta: BlockDelta::InputJsonDelta { partial_json: arguments },
                        });
                    }
                }
            }

            if let Some(reason) = &choice.finish_reason {
                self.stop_reason = map_finish_reason(reason);
            }
        }

        if let Some(usage) = &chunk.usage {
            self.output_tokens = usage.completion_tokens;
        }

        events
    }

    /// Call once the upstream stream is exhausted (or `[DONE]` seen) to close every open block
    /// and emit the terminal `message_delta`/`message_stop` pair.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(index) = self.text_block_index {
            if !self.text_block_closed {
                self.text_block_closed = true;
                events.push(StreamEvent::ContentBlockStop { index });
            }
        }

        let mut tool_indices: Vec<usize> = self.tool_trackers.values().map(|t| t.block_index).collect();
        tool_indices.sort_unstable();
        for index in tool_indices {
            events.push(StreamEvent::ContentBlockStop { index });
        }

        events.push(StreamEvent::MessageDelta {
            delta: MessageDeltaPayload {
                stop_reason: self.stop_reason,
                stop_sequence: None,
            },
            usage: StreamUsage {
                input_tokens: 0,
                output_tokens: self.output_tokens,
            },
        });
        events.push(StreamEvent::MessageStop);

        events
    }
}

fn map_finish_reason(reason: &str) -> StopReason {
    match reason {
        "tool_calls" => StopReason::ToolUse,
        "length" => StopReason::MaxTokens,
        _ => StopReason::EndTurn,
    }
}

/// Drives a [`Translator`] line-by-line over a raw upstream SSE byte stream. `line` is one
/// already-decoded-to-UTF8 line, with or without its trailing newline.
pub fn process_line(translator: &mut Translator, line: &str) -> Vec<StreamEvent> {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(data) = line.strip_prefix("data:") else {
        return Vec::new();
    };
    let data = data.trim();

    if data == "[DONE]" {
        return translator.finish();
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => translator.push(&chunk),
        Err(err) => {
            log::debug!("skipping undecodable upstream chunk: {err}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chunk(value: serde_json::Value) -> ChatCompletionChunk {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn s5_streamed_tool_call() {
        let mut translator = Translator::new("claude-sonnet-4.5".into());
        let mut events = Vec::new();

        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"content": "Let me read that."}}]
        }))));
        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_123", "function": {"name": "read_file", "arguments": ""}}
            ]}}]
        }))));
        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "{\"path\":"}}
            ]}, "finish_reason": "tool_calls"}]
        }))));
        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "\"/tmp/test.txt\"}"}}
            ]}}]
        }))));
        events.extend(translator.finish());

        let names: Vec<&'static str> = events.iter().map(StreamEvent::name).collect();
        assert_eq!(
            names,
            vec![
                "message_start",
                "content_block_start",
                "content_block_delta",
                "content_block_stop",
                "content_block_start",
                "content_block_delta",
                "content_block_delta",
                "content_block_stop",
                "message_delta",
                "message_stop",
            ]
        );

        let StreamEvent::ContentBlockStart {
            index: 1,
            content_block: ContentBlockStart::ToolUse { id, name, .. },
        } = &events[4]
        else {
            panic!("expected tool_use content_block_start at position 4");
        };
        assert_eq!(id, "call_123");
        assert_eq!(name, "read_file");
    }

    /// The text block must close the instant a tool-call block opens, not linger until
    /// `finish()` — even when more text deltas for the *same* upstream choice would otherwise
    /// follow the tool-call fragment in a later chunk.
    #[test]
    fn text_block_closes_eagerly_when_tool_call_opens() {
        let mut translator = Translator::new("claude-sonnet-4.5".into());
        let mut events = Vec::new();

        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"content": "Looking that up..."}}]
        }))));
        events.extend(translator.push(&chunk(json!({
            "choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_1", "function": {"name": "lookup", "arguments": "{}"}}
            ]}}]
        }))));

        let names: Vec<&'static str> = events.iter().map(StreamEvent::name).collect();
        assert_eq!(
            names,
            vec![
                "message_start",
                "content_block_start",
                "content_block_delta",
                "content_block_stop",
                "content_block_start",
                "content_block_delta",
            ]
        );
        assert!(matches!(events[3], StreamEvent::ContentBlockStop { index: 0 }));

        // `finish()` must not close the text block a second time.
        let finish_events = translator.finish();
        let stop_count = finish_events
            .iter()
            .filter(|event| matches!(event, StreamEvent::ContentBlockStop { .. }))
            .count();
        assert_eq!(stop_count, 1, "only the tool-call block should still need closing");
    }

    #[test]
    fn process_line_skips_non_data_lines() {
        let mut translator = Translator::new("m".into());
        assert!(process_line(&mut translator, ": keep-alive").is_empty());
    }

    #[test]
    fn process_line_done_finishes_stream() {
        let mut translator = Translator::new("m".into());
        translator.push(&chunk(json!({"choices": [{"delta": {"content": "hi"}}]})));
        let events = process_line(&mut translator, "data: [DONE]");
        assert!(matches!(events.last(), Some(StreamEvent::MessageStop)));
    }
}
