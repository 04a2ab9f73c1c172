//! OpenAI response → Anthropic response, non-streaming (§4.3.4).

use serde_json::Value;

use crate::anthropic;
use crate::openai;

pub fn translate(resp: openai::ChatCompletionResponse, model: String) -> anthropic::MessagesResponse {
    let mut content = Vec::new();
    let mut finish_reason = None;

    for choice in &resp.choices {
        let Some(message) = &choice.message else { continue };

        if let Some(openai::MessageContent::Text(text)) = &message.content {
            if !text.is_empty() {
                content.push(anthropic::ContentBlock::Text { text: text.clone() });
            }
        }

        if finish_reason.is_none() {
            finish_reason = choice.finish_reason.clone();
        }
    }

    for choice in &resp.choices {
        let Some(message) = &choice.message else { continue };
        for call in message.tool_calls.iter().flatten() {
            let input: Value = serde_json::from_str(&call.function.arguments).unwrap_or_else(|_| serde_json::json!({}));
            content.push(anthropic::ContentBlock::ToolUse {
                id: call.id.clone(),
                name: call.function.name.clone(),
                input,
            });
        }
    }

    if content.is_empty() {
        content.push(anthropic::ContentBlock::Text { text: String::new() });
    }

    let usage = resp.usage.unwrap_or(openai::Usage {
        prompt_tokens: 0,
        completion_tokens: 0,
    });

    anthropic::MessagesResponse {
        id: format!("msg_{}", uuid::Uuid::new_v4()),
        kind: "message",
        role: "assistant",
        model,
        content,
        stop_reason: map_finish_reason(finish_reason.as_deref()),
        stop_sequence: None,
        usage: anthropic::Usage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
    }
}

fn map_finish_reason(reason: Option<&str>) -> anthropic::StopReason {
    match reason {
        Some("length") => anthropic::StopReason::MaxTokens,
        Some("tool_calls") => anthropic::StopReason::ToolUse,
        _ => anthropic::StopReason::EndTurn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn s4_split_choice_response() {
        let resp: openai::ChatCompletionResponse = serde_json::from_value(json!({
            "id": "chatcmpl-1",
            "model": "claude-sonnet-4.5",
            "choices": [
                {"message": {"role": "assistant", "content": "I'll compute."}, "finish_reason": "tool_calls"},
                {"message": {"role": "assistant", "tool_calls": [
                    {"id": "tc", "type": "function", "function": {"name": "calc", "arguments": "{\"x\":1}"}}
                ]}, "finish_reason": "tool_calls"}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }))
        .unwrap();

        let out = response_for_test(resp);
        assert_eq!(out.stop_reason, anthropic::StopReason::ToolUse);
        assert_eq!(out.content.len(), 2);

        match &out.content[0] {
            anthropic::ContentBlock::Text { text } => assert_eq!(text, "I'll compute."),
            other => panic!("expected text block, got {other:?}"),
        }
        match &out.content[1] {
            anthropic::ContentBlock::ToolUse { id, name, input } => {
                assert_eq!(id, "tc");
                assert_eq!(name, "calc");
                assert_eq!(input["x"], 1);
            }
            other => panic!("expected tool_use block, got {other:?}"),
        }
    }

    fn response_for_test(resp: openai::ChatCompletionResponse) -> anthropic::MessagesResponse {
        translate(resp, "claude-sonnet-4.5".into())
    }
}
