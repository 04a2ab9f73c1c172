//! The Anthropic-to-upstream model name table and its fuzzy fallback.

const TABLE: &[(&str, &str)] = &[
    ("claude-sonnet-4-5-20250929", "claude-sonnet-4.5"),
    ("claude-sonnet-4-5", "claude-sonnet-4.5"),
    ("claude-opus-4-6-20251015", "claude-opus-4.6"),
    ("claude-opus-4-6", "claude-opus-4.6"),
    ("claude-opus-4-1-20250805", "claude-opus-4.1"),
    ("claude-opus-4-20250514", "claude-opus-4"),
    ("claude-3-7-sonnet-20250219", "claude-3.7-sonnet"),
    ("claude-3-5-sonnet-20241022", "claude-3.5-sonnet"),
    ("claude-3-haiku-20240307", "claude-haiku-4.5"),
    ("claude-haiku-4-5", "claude-haiku-4.5"),
];

const FAMILIES: &[&str] = &["sonnet", "opus", "haiku"];

/// Latest known generation per family, used when no version hint is present in the input name.
fn latest_generation(family: &str) -> &'static str {
    match family {
        "sonnet" => "4.5",
        "opus" => "4.6",
        "haiku" => "4.5",
        _ => unreachable!("family is one of FAMILIES"),
    }
}

/// Resolves an Anthropic-dialect model name to the upstream's name. Exact matches in [`TABLE`]
/// win; otherwise a fuzzy family/version-hint match is attempted; otherwise the name passes
/// through unchanged (this is how foreign names like `gpt-4o` survive).
pub fn resolve(name: &str) -> String {
    if let Some((_, upstream)) = TABLE.iter().find(|(anthropic, _)| *anthropic == name) {
        return (*upstream).to_owned();
    }

    let lower = name.to_ascii_lowercase();
    let Some(family) = FAMILIES.iter().find(|family| lower.contains(**family)) else {
        return name.to_owned();
    };

    let generation = if lower.contains("4-5") || lower.contains("4.5") {
        "4.5"
    } else if lower.contains("4-6") || lower.contains("4.6") {
        "4.6"
    } else {
        latest_generation(family)
    };

    format!("claude-{family}-{generation}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_table_entries_resolve() {
        assert_eq!(resolve("claude-3-haiku-20240307"), "claude-haiku-4.5");
        assert_eq!(resolve("claude-opus-4-6-20251015"), "claude-opus-4.6");
    }

    #[test]
    fn fuzzy_fallback_uses_version_hint() {
        assert_eq!(resolve("claude-sonnet-4-5-unreleased"), "claude-sonnet-4.5");
        assert_eq!(resolve("claude-opus-4.6-preview"), "claude-opus-4.6");
    }

    #[test]
    fn fuzzy_fallback_uses_latest_generation_without_hint() {
        assert_eq!(resolve("claude-sonnet-mystery"), "claude-sonnet-4.5");
    }

    #[test]
    fn foreign_names_pass_through_unchanged() {
        assert_eq!(resolve("gpt-4o"), "gpt-4o");
    }
}
