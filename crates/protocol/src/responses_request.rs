//! Pre-processing applied to `POST /v1/responses` bodies before they reach the upstream
//! (service_tier stripping, vision/initiator header shaping, `apply_patch` rewrite — §6).

use serde_json::{json, Value};

const VISION_PART_TYPES: &[&str] = &["input_image", "image", "image_url"];
const AGENT_ITEM_TYPES: &[&str] = &["function_call", "function_call_output", "reasoning"];

/// Removes the `service_tier` field, which the upstream rejects.
pub fn strip_service_tier(body: &mut Value) {
    if let Some(obj) = body.as_object_mut() {
        obj.remove("service_tier");
    }
}

/// True if any input item's content contains a part whose `type` is an image variant.
pub fn has_vision_input(body: &Value) -> bool {
    let Some(input) = body.get("input").and_then(Value::as_array) else {
        return false;
    };

    input.iter().any(|item| {
        item.get("content")
            .and_then(Value::as_array)
            .map(|parts| {
                parts.iter().any(|part| {
                    part.get("type")
                        .and_then(Value::as_str)
                        .is_some_and(|kind| VISION_PART_TYPES.contains(&kind))
                })
            })
            .unwrap_or(false)
    })
}

/// `"agent"` if the last input item looks like it came from an agent loop (assistant role, or
/// a function-call/reasoning item type); `"user"` otherwise.
pub fn initiator(body: &Value) -> &'static str {
    let Some(last) = body.get("input").and_then(Value::as_array).and_then(|items| items.last()) else {
        return "user";
    };

    let is_assistant = last.get("role").and_then(Value::as_str) == Some("assistant");
    let is_agent_type = last
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|kind| AGENT_ITEM_TYPES.contains(&kind));

    if is_assistant || is_agent_type {
        "agent"
    } else {
        "user"
    }
}

/// Rewrites a `{type:"custom", name:"apply_patch"}` tool entry, if present, into the function
/// shape the upstream expects.
pub fn rewrite_apply_patch_tool(body: &mut Value) {
    let Some(tools) = body.get_mut("tools").and_then(Value::as_array_mut) else {
        return;
    };

    for tool in tools.iter_mut() {
        let is_custom_apply_patch = tool.get("type").and_then(Value::as_str) == Some("custom")
            && tool.get("name").and_then(Value::as_str) == Some("apply_patch");

        if is_custom_apply_patch {
            *tool = json!({
                "type": "function",
                "name": "apply_patch",
                "description": "Use the apply_patch tool to edit files",
                "parameters": {
                    "type": "object",
                    "properties": {"input": {"type": "string"}},
                    "required": ["input"],
                },
                "strict": false,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detects_vision_input() {
        let body = json!({"input": [{"role": "user", "content": [{"type": "input_image", "image_url": "x"}]}]});
        assert!(has_vision_input(&body));
    }

    #[test]
    fn no_vision_when_text_only() {
        let body = json!({"input": [{"role": "user", "content": [{"type": "input_text", "text": "hi"}]}]});
        assert!(!has_vision_input(&body));
    }

    #[test]
    fn initiator_is_agent_for_function_call_output() {
        let body = json!({"input": [{"type": "function_call_output", "output": "42"}]});
        assert_eq!(initiator(&body), "agent");
    }

    #[test]
    fn initiator_is_user_by_default() {
        let body = json!({"input": [{"role": "user", "content": "hi"}]});
        assert_eq!(initiator(&body), "user");
    }

    #[test]
    fn apply_patch_tool_is_rewritten_to_function() {
        let mut body = json!({"tools": [{"type": "custom", "name": "apply_patch"}]});
        rewrite_apply_patch_tool(&mut body);
        assert_eq!(body["tools"][0]["type"], "function");
        assert_eq!(body["tools"][0]["parameters"]["required"][0], "input");
    }

    #[test]
    fn service_tier_is_removed() {
        let mut body = json!({"service_tier": "auto", "model": "gpt-5"});
        strip_service_tier(&mut body);
        assert!(body.get("service_tier").is_none());
    }
}
