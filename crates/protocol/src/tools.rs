//! Tool, tool-choice, and image block conversion (§4.3.2, §4.3.3).

use serde_json::{json, Value};

use crate::anthropic;
use crate::openai;

/// Anthropic built-in tool type prefixes that have no upstream schema; mapped to a plain
/// function with a synthetic description so the upstream at least sees a named tool.
const BUILTIN_PREFIXES: &[&str] = &["computer_", "bash_", "text_editor_"];

pub fn image_block_to_openai(source: &anthropic::ImageSource) -> openai::ContentPart {
    let url = match source {
        anthropic::ImageSource::Base64 { media_type, data } => {
            let media_type = if media_type.is_empty() { "image/png" } else { media_type };
            format!("data:{media_type};base64,{data}")
        }
        anthropic::ImageSource::Url { url } => url.clone(),
    };

    openai::ContentPart::ImageUrl {
        image_url: openai::ImageUrl { url },
    }
}

pub fn tool_to_openai(tool: &anthropic::Tool) -> openai::Tool {
    let is_builtin = BUILTIN_PREFIXES.iter().any(|prefix| tool.name.starts_with(prefix));

    let description = if is_builtin {
        Some(format!("Built-in Anthropic tool: {}", tool.name))
    } else {
        tool.description.clone()
    };

    let parameters = tool
        .input_schema
        .clone()
        .unwrap_or_else(|| json!({"type": "object", "properties": {}}));

    openai::Tool {
        kind: "function",
        function: openai::FunctionDef {
            name: tool.name.clone(),
            description,
            parameters,
        },
    }
}

pub fn tool_choice_to_openai(choice: &anthropic::ToolChoice) -> openai::ToolChoice {
    match choice {
        anthropic::ToolChoice::Shorthand(mode) => mode_to_openai(mode),
        anthropic::ToolChoice::Typed { kind, name } => match kind.as_str() {
            "auto" => openai::ToolChoice::Mode("auto".to_owned()),
            "any" => openai::ToolChoice::Mode("required".to_owned()),
            "none" => openai::ToolChoice::Mode("none".to_owned()),
            "tool" => match name {
                Some(name) => openai::ToolChoice::Specific {
                    kind: "function",
                    function: openai::FunctionName { name: name.clone() },
                },
                None => openai::ToolChoice::Mode("auto".to_owned()),
            },
            _ => openai::ToolChoice::Mode("auto".to_owned()),
        },
    }
}

fn mode_to_openai(mode: &str) -> openai::ToolChoice {
    match mode {
        "auto" => openai::ToolChoice::Mode("auto".to_owned()),
        "any" => openai::ToolChoice::Mode("required".to_owned()),
        "none" => openai::ToolChoice::Mode("none".to_owned()),
        _ => openai::ToolChoice::Mode("auto".to_owned()),
    }
}

/// Encodes a tool_result's content the way `request.rs` needs it for a `role: "tool"` message.
pub fn tool_result_text(content: &Option<anthropic::ToolResultContent>, is_error: bool) -> String {
    let body = match content {
        None => String::new(),
        Some(anthropic::ToolResultContent::Text(text)) => text.clone(),
        Some(anthropic::ToolResultContent::Blocks(blocks)) => blocks
            .iter()
            .filter_map(|block| match block {
                anthropic::ContentBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(anthropic::ToolResultContent::Other(value)) => value.to_string(),
    };

    if is_error {
        format!("[ERROR] {body}")
    } else {
        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base64_image_becomes_data_url() {
        let part = image_block_to_openai(&anthropic::ImageSource::Base64 {
            media_type: "image/jpeg".into(),
            data: "abcd".into(),
        });
        let openai::ContentPart::ImageUrl { image_url } = part else {
            panic!("expected image_url part");
        };
        assert_eq!(image_url.url, "data:image/jpeg;base64,abcd");
    }

    #[test]
    fn builtin_tool_gets_synthetic_description() {
        let tool = anthropic::Tool {
            name: "bash_20250124".into(),
            description: None,
            input_schema: None,
        };
        let converted = tool_to_openai(&tool);
        assert!(converted.function.description.unwrap().contains("bash_20250124"));
    }

    #[test]
    fn error_tool_result_is_prefixed() {
        let text = tool_result_text(&Some(anthropic::ToolResultContent::Text("boom".into())), true);
        assert_eq!(text, "[ERROR] boom");
    }
}
