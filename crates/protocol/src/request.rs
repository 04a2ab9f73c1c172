//! Anthropic request → OpenAI request (§4.3.1).

use crate::anthropic;
use crate::model_map;
use crate::openai;
use crate::tools;

pub fn translate(req: anthropic::MessagesRequest) -> openai::ChatCompletionRequest {
    let mut messages = Vec::with_capacity(req.messages.len() + 1);

    if let Some(system) = req.system {
        let text = match system {
            anthropic::SystemPrompt::Text(text) => text,
            anthropic::SystemPrompt::Blocks(blocks) => blocks
                .into_iter()
                .map(|block| block.text)
                .collect::<Vec<_>>()
                .join("\n"),
        };
        messages.push(openai::ChatMessage {
            role: openai::ChatRole::System,
            content: Some(openai::MessageContent::Text(text)),
            tool_calls: None,
            tool_call_id: None,
        });
    }

    for message in req.messages {
        translate_message(message, &mut messages);
    }

    openai::ChatCompletionRequest {
        model: model_map::resolve(&req.model),
        messages,
        max_tokens: req.max_tokens,
        temperature: req.temperature,
        top_p: req.top_p,
        stream: req.stream,
        stop: req.stop_sequences,
        tools: req.tools.map(|tools| tools.iter().map(tools::tool_to_openai).collect()),
        tool_choice: req.tool_choice.as_ref().map(tools::tool_choice_to_openai),
    }
}

fn translate_message(message: anthropic::Message, out: &mut Vec<openai::ChatMessage>) {
    let role = match message.role {
        anthropic::Role::User => openai::ChatRole::User,
        anthropic::Role::Assistant => openai::ChatRole::Assistant,
    };

    let blocks = match message.content {
        anthropic::Content::Text(text) => {
            out.push(openai::ChatMessage {
                role,
                content: Some(openai::MessageContent::Text(text)),
                tool_calls: None,
                tool_call_id: None,
            });
            return;
        }
        anthropic::Content::Blocks(blocks) => blocks,
    };

    let mut parts = Vec::new();
    let mut tool_uses = Vec::new();
    let mut tool_results = Vec::new();

    for block in blocks {
        match block {
            anthropic::ContentBlock::ToolUse { id, name, input } if role == openai::ChatRole::Assistant => {
                tool_uses.push((id, name, input));
            }
            anthropic::ContentBlock::ToolResult {
                tool_use_id,
                content,
                is_error,
            } if role == openai::ChatRole::User => {
                tool_results.push((tool_use_id, content, is_error.unwrap_or(false)));
            }
            other => parts.push(other),
        }
    }

    if role == openai::ChatRole::Assistant && !tool_uses.is_empty() {
        let text = join_text(&parts);
        out.push(openai::ChatMessage {
            role,
            content: text.map(openai::MessageContent::Text),
            tool_calls: Some(
                tool_uses
                    .into_iter()
                    .map(|(id, name, input)| openai::ToolCall {
                        id: if id.is_empty() { format!("toolu_{}", uuid::Uuid::new_v4()) } else { id },
                        kind: "function",
                        function: openai::FunctionCall {
                            name,
                            arguments: serde_json::to_string(&input).unwrap_or_else(|_| "{}".to_owned()),
                        },
                    })
                    .collect(),
            ),
            tool_call_id: None,
        });
        return;
    }

    if role == openai::ChatRole::User && !tool_results.is_empty() {
        if !parts.is_empty() {
            out.push(openai::ChatMessage {
                role,
                content: Some(content_from_parts(parts)),
                tool_calls: None,
                tool_call_id: None,
            });
        }
        for (tool_use_id, content, is_error) in tool_results {
            out.push(openai::ChatMessage {
                role: openai::ChatRole::Tool,
                content: Some(openai::MessageContent::Text(tools::tool_result_text(&content, is_error))),
                tool_calls: None,
                tool_call_id: Some(tool_use_id),
            });
        }
        return;
    }

    out.push(openai::ChatMessage {
        role,
        content: Some(content_from_parts(parts)),
        tool_calls: None,
        tool_call_id: None,
    });
}

fn join_text(blocks: &[anthropic::ContentBlock]) -> Option<String> {
    let joined = blocks
        .iter()
        .filter_map(|block| match block {
            anthropic::ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn content_from_parts(blocks: Vec<anthropic::ContentBlock>) -> openai::MessageContent {
    let has_non_text = blocks
        .iter()
        .any(|block| !matches!(block, anthropic::ContentBlock::Text { .. }));

    if blocks.len() == 1 && !has_non_text {
        let anthropic::ContentBlock::Text { text } = blocks.into_iter().next().unwrap() else {
            unreachable!("checked above");
        };
        return openai::MessageContent::Text(text);
    }

    let parts = blocks
        .into_iter()
        .map(|block| match block {
            anthropic::ContentBlock::Text { text } => openai::ContentPart::Text { text },
            anthropic::ContentBlock::Image { source } => tools::image_block_to_openai(&source),
            _ => openai::ContentPart::Text { text: String::new() },
        })
        .collect();

    openai::MessageContent::Parts(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user_text(text: &str) -> anthropic::Message {
        anthropic::Message {
            role: anthropic::Role::User,
            content: anthropic::Content::Text(text.to_owned()),
        }
    }

    #[test]
    fn s1_minimal_forward() {
        let req = anthropic::MessagesRequest {
            model: "claude-3-haiku-20240307".into(),
            messages: vec![user_text("ping")],
            system: None,
            max_tokens: Some(8),
            temperature: None,
            top_p: None,
            stream: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
        };

        let out = translate(req);
        assert_eq!(out.model, "claude-haiku-4.5");
        assert_eq!(out.max_tokens, Some(8));
        assert_eq!(out.messages.len(), 1);
        assert!(matches!(out.messages[0].role, openai::ChatRole::User));
        assert!(matches!(
            out.messages[0].content,
            Some(openai::MessageContent::Text(ref text)) if text == "ping"
        ));
    }

    #[test]
    fn s2_stop_sequences_renamed() {
        let req = anthropic::MessagesRequest {
            model: "gpt-4o".into(),
            messages: vec![user_text("hi")],
            system: None,
            max_tokens: None,
            temperature: None,
            top_p: None,
            stream: None,
            stop_sequences: Some(vec!["###".into()]),
            tools: None,
            tool_choice: None,
        };

        let out = translate(req);
        assert_eq!(out.stop, Some(vec!["###".to_owned()]));
    }

    #[test]
    fn s3_tool_round_trip() {
        let messages = vec![
            user_text("read the file"),
            anthropic::Message {
                role: anthropic::Role::Assistant,
                content: anthropic::Content::Blocks(vec![anthropic::ContentBlock::ToolUse {
                    id: "toolu_abc123".into(),
                    name: "read_file".into(),
                    input: json!({"path": "/tmp/test.txt"}),
                }]),
            },
            anthropic::Message {
                role: anthropic::Role::User,
                content: anthropic::Content::Blocks(vec![anthropic::ContentBlock::ToolResult {
                    tool_use_id: "toolu_abc123".into(),
                    content: Some(anthropic::ToolResultContent::Text("file contents".into())),
                    is_error: None,
                }]),
            },
        ];

        let req = anthropic::MessagesRequest {
            model: "gpt-4o".into(),
            messages,
            system: None,
            max_tokens: Some(100),
            temperature: None,
            top_p: None,
            stream: None,
            stop_sequences: None,
            tools: None,
            tool_choice: None,
        };

        let out = translate(req);
        assert_eq!(out.messages.len(), 3);

        let tool_calls = out.messages[1].tool_calls.as_ref().unwrap();
        assert_eq!(tool_calls[0].id, "toolu_abc123");
        assert_eq!(tool_calls[0].function.arguments, r#"{"path":"/tmp/test.txt"}"#);

        assert!(matches!(out.messages[2].role, openai::ChatRole::Tool));
        assert_eq!(out.messages[2].tool_call_id.as_deref(), Some("toolu_abc123"));
    }
}
