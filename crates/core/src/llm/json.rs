use crate::domain::suggestion::RawSuggestion;
use anyhow::{bail, Context};
use serde_json::Value;

/// Strips Markdown fences and any leading prose so that the text starts at the
/// first `[` or `{`.
pub fn extract_json(text: &str) -> &str {
    let mut inner = text.trim();
    if let Some(after_fence) = inner.strip_prefix("```") {
        // Drop the language tag (```json) together with the fence.
        inner = after_fence
            .trim_start_matches(|c: char| c.is_ascii_alphabetic())
            .trim_start();
        if let Some(before_fence) = inner.strip_suffix("```") {
            inner = before_fence.trim();
        }
    }

    let start = match (inner.find('['), inner.find('{')) {
        (Some(bracket), Some(brace)) => Some(bracket.min(brace)),
        (bracket, brace) => bracket.or(brace),
    };
    match start {
        Some(idx) => &inner[idx..],
        None => inner,
    }
}

/// Parses model output into raw suggestion objects. A single object is wrapped
/// into a one-element list; array entries that are not objects are ignored.
pub fn parse_candidates(text: &str) -> anyhow::Result<Vec<RawSuggestion>> {
    let json_str = extract_json(text);
    let parsed = serde_json::from_str::<Value>(json_str)
        .with_context(|| format!("model output is not valid JSON: {json_str}"))?;

    match parsed {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(obj) => Some(obj),
                _ => None,
            })
            .collect()),
        Value::Object(obj) => Ok(vec![obj]),
        other => bail!("model output is neither an array nor an object: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = concat!(
        r#"[{"destination":"Hampi, Karnataka","summary":"Ruins.","#,
        r#""tags":["history"],"approxBaseCost":9000}]"#
    );

    #[test]
    fn fenced_array_parses_like_bare_array() {
        let fenced = format!("```json\n{BODY}\n```");
        assert_eq!(
            parse_candidates(&fenced).unwrap(),
            parse_candidates(BODY).unwrap()
        );
        assert_eq!(extract_json(&fenced), BODY);
    }

    #[test]
    fn fence_without_language_tag() {
        let fenced = format!("```\n{BODY}\n```\n");
        assert_eq!(parse_candidates(&fenced).unwrap().len(), 1);
    }

    #[test]
    fn skips_leading_prose_before_array() {
        let text = format!("Sure! {BODY}");
        let parsed = parse_candidates(&text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["destination"], "Hampi, Karnataka");
    }

    #[test]
    fn earliest_opening_character_wins() {
        assert_eq!(extract_json("note: {\"a\": [1]}"), "{\"a\": [1]}");
        assert_eq!(extract_json("list: [{\"a\": 1}]"), "[{\"a\": 1}]");
    }

    #[test]
    fn wraps_single_object() {
        let parsed = parse_candidates(r#"{"destination":"Coorg"}"#).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0]["destination"], "Coorg");
    }

    #[test]
    fn rejects_scalars_and_garbage() {
        assert!(parse_candidates("42").is_err());
        assert!(parse_candidates("\"just text\"").is_err());
        assert!(parse_candidates("I cannot help with that.").is_err());
        assert!(parse_candidates("[{\"destination\": ").is_err());
    }
}
