//! Text field extraction from free-form listing text.
//!
//! The prompt asks the LLM for a flat JSON object keyed by the requested
//! field names; values the model could not find come back as `null`.

use anyhow::{Context, Result};
use openai_client::strip_code_blocks;
use serde_json::Value;

use super::models::ExtractedFields;
use crate::domains::templates::data::TextFieldSpec;
use crate::domains::templates::models::Template;
use crate::kernel::BaseAI;

const ELLIPSIS: char = '…';

/// Text fields declared by any stored template, in declaration order.
///
/// A name declared by several templates is requested once, with the
/// tightest length limit any of them sets.
pub fn requested_fields(templates: &[Template]) -> Vec<TextFieldSpec> {
    let mut fields: Vec<TextFieldSpec> = Vec::new();
    for field in templates.iter().flat_map(Template::text_field_specs) {
        match fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => {
                existing.approx_length = match (existing.approx_length, field.approx_length) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
                if existing.format.is_none() {
                    existing.format = field.format;
                }
            }
            None => fields.push(field),
        }
    }
    fields
}

fn describe_field(field: &TextFieldSpec) -> String {
    let mut line = format!("- {}", field.name);
    if let Some(limit) = field.approx_length {
        line.push_str(&format!(", approx_size: {}", limit));
    }
    if let Some(format) = &field.format {
        line.push_str(&format!(", format: {}", format));
    }
    line
}

pub fn build_extraction_prompt(fields: &[TextFieldSpec], input_text: &str) -> String {
    let field_list = fields
        .iter()
        .map(describe_field)
        .collect::<Vec<_>>()
        .join("\n");
    let json_template = format!(
        "{{\n{}\n}}",
        fields
            .iter()
            .map(|field| format!("  \"{}\": \"...\"", field.name))
            .collect::<Vec<_>>()
            .join(",\n")
    );

    let mut prompt = format!(
        r#"You are an intelligent field extractor.

Your task is to extract structured information from the unstructured input text below.

Extract the following fields. If any field is missing or unclear in the text, return `null` for that field.
This is for a real estate advertisement.

Fields to extract:
{field_list}

Output the result as a valid JSON object like this:
{json_template}

--- Begin Input ---
{input_text}
--- End Input ---"#
    );

    if fields.iter().any(|f| f.approx_length.is_some() || f.format.is_some()) {
        prompt.push_str(
            r#"

Length and format rules:
- `approx_size` is a HARD MAXIMUM number of characters, counting spaces and punctuation.
- To fit, drop filler words (very, really, stunning, beautiful, amazing), articles and parentheticals, and prefer short forms (and -> &, with -> w/, approximately -> approx).
- If the value still does not fit, cut it at the end of a word. If nothing meaningful fits, return null.
- Follow the shape shown in `format`, e.g. keep "3 BED | 2 BATH" style separators.
- Do not pad values to use up space."#,
        );
    }

    prompt
}

pub fn build_shortening_prompt(value: &str, max_chars: usize) -> String {
    format!(
        "Shorten the following text to at most {} characters: {}\n\nReturn only the shortened text and nothing else.",
        max_chars, value
    )
}

/// Cut `value` to at most `max_chars` characters, marking the cut with `…`.
pub fn truncate_value(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let mut truncated: String = value.chars().take(max_chars).collect();
    truncated.push(ELLIPSIS);
    truncated
}

/// Length limit for one field: its own `approx_length`, else `default_max`.
pub fn field_limit(field: &TextFieldSpec, default_max: usize) -> usize {
    field.approx_length.map_or(default_max, |n| n as usize)
}

/// Parse the model answer, keeping only requested fields with a value.
/// Values are returned as the model wrote them (trimmed, not yet cut).
pub fn parse_extraction_response(raw: &str, fields: &[TextFieldSpec]) -> Result<ExtractedFields> {
    let value: Value = serde_json::from_str(strip_code_blocks(raw))
        .context("Extraction response is not valid JSON")?;

    let Value::Object(map) = value else {
        anyhow::bail!("Extraction response is not a JSON object");
    };

    let mut extracted = ExtractedFields::new();
    for field in fields {
        let text = match map.get(&field.name) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(other) => {
                tracing::warn!(field = %field.name, value = %other, "Ignoring non-scalar extracted value");
                continue;
            }
        };
        if text.is_empty() || text.eq_ignore_ascii_case("null") {
            continue;
        }
        extracted.insert(field.name.clone(), text);
    }

    Ok(extracted)
}

/// Bring every value within its field's limit.
///
/// Fields with their own `approx_length` are first shortened by the LLM;
/// anything still too long is cut with `…`.
pub async fn fit_to_limits(
    ai: &dyn BaseAI,
    fields: &[TextFieldSpec],
    extracted: ExtractedFields,
    default_max: usize,
) -> Result<ExtractedFields> {
    let mut fitted = ExtractedFields::new();
    for field in fields {
        let Some(value) = extracted.get(&field.name) else {
            continue;
        };
        let limit = field_limit(field, default_max);
        let mut value = value.to_string();

        if field.approx_length.is_some() && value.chars().count() > limit {
            let shortened = ai
                .complete(&build_shortening_prompt(&value, limit))
                .await
                .with_context(|| format!("Failed to shorten field '{}'", field.name))?;
            tracing::debug!(
                field = %field.name,
                before = value.chars().count(),
                after = shortened.trim().chars().count(),
                limit,
                "Shortened extracted value"
            );
            let shortened = shortened.trim();
            if !shortened.is_empty() {
                value = shortened.to_string();
            }
        }

        fitted.insert(field.name.clone(), truncate_value(&value, limit));
    }
    Ok(fitted)
}

/// Ask the LLM for `fields` found in `input_text`.
///
/// Skips the call when there is nothing to ask for or nothing to read.
pub async fn extract_fields(
    ai: &dyn BaseAI,
    fields: &[TextFieldSpec],
    input_text: &str,
    max_chars: usize,
) -> Result<ExtractedFields> {
    if fields.is_empty() || input_text.trim().is_empty() {
        tracing::debug!(
            field_count = fields.len(),
            text_length = input_text.len(),
            "Skipping text extraction"
        );
        return Ok(ExtractedFields::new());
    }

    let prompt = build_extraction_prompt(fields, input_text);
    let raw = ai
        .complete_json(&prompt)
        .await
        .context("Text field extraction call failed")?;

    let extracted = parse_extraction_response(&raw, fields)?;
    let extracted = fit_to_limits(ai, fields, extracted, max_chars).await?;

    tracing::info!(
        requested = fields.len(),
        extracted = extracted.len(),
        "Extracted listing fields"
    );

    Ok(extracted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::MockAI;

    fn fields(names: &[&str]) -> Vec<TextFieldSpec> {
        names.iter().map(|s| TextFieldSpec::named(*s)).collect()
    }

    fn limited(name: &str, approx_length: u32) -> TextFieldSpec {
        TextFieldSpec {
            name: name.to_string(),
            approx_length: Some(approx_length),
            format: None,
        }
    }

    #[test]
    fn prompt_lists_fields_and_wraps_input() {
        let prompt = build_extraction_prompt(&fields(&["f_title", "f_price"]), "Nice house, $300k");

        assert!(prompt.contains("- f_title\n- f_price"));
        assert!(prompt.contains("  \"f_title\": \"...\",\n  \"f_price\": \"...\""));
        assert!(prompt.contains("--- Begin Input ---\nNice house, $300k\n--- End Input ---"));
        assert!(prompt.contains("return `null`"));
        assert!(!prompt.contains("HARD MAXIMUM"));
    }

    #[test]
    fn prompt_lists_limits_and_formats() {
        let features = TextFieldSpec {
            name: "f_features".into(),
            approx_length: Some(20),
            format: Some("3 BED | 2 BATH".into()),
        };
        let prompt = build_extraction_prompt(&[TextFieldSpec::named("f_title"), features], "text");

        assert!(prompt.contains("- f_title\n- f_features, approx_size: 20, format: 3 BED | 2 BATH"));
        assert!(prompt.contains("HARD MAXIMUM"));
    }

    #[test]
    fn parse_drops_nulls_and_unrequested_keys() {
        let raw = r#"{"f_title": "Sunny cottage", "f_price": null, "extra": "x"}"#;
        let extracted = parse_extraction_response(raw, &fields(&["f_title", "f_price"])).unwrap();

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted.get("f_title"), Some("Sunny cottage"));
        assert_eq!(extracted.get("f_price"), None);
        assert_eq!(extracted.get("extra"), None);
    }

    #[test]
    fn parse_tolerates_code_fences_and_numbers() {
        let raw = "```json\n{\"f_beds\": 3, \"f_title\": \"  Loft  \"}\n```";
        let extracted = parse_extraction_response(raw, &fields(&["f_beds", "f_title"])).unwrap();

        assert_eq!(extracted.get("f_beds"), Some("3"));
        assert_eq!(extracted.get("f_title"), Some("Loft"));
    }

    #[test]
    fn parse_rejects_non_objects() {
        assert!(parse_extraction_response("[1, 2]", &fields(&["a"])).is_err());
        assert!(parse_extraction_response("not json", &fields(&["a"])).is_err());
    }

    #[test]
    fn long_values_are_truncated_with_ellipsis() {
        assert_eq!(truncate_value("abcdef", 3), "abc…");
        assert_eq!(truncate_value("abc", 3), "abc");
        assert_eq!(truncate_value("héllo wörld", 5), "héllo…");
    }

    #[test]
    fn requested_fields_keep_tightest_limit() {
        use crate::domains::templates::models::Template;
        use chrono::Utc;
        use sqlx::types::Json;
        use uuid::Uuid;

        let template = |name: &str, details: Vec<TextFieldSpec>| Template {
            id: Uuid::now_v7(),
            position: 0,
            name: name.to_string(),
            realtor_name: "r_name".into(),
            realtor_address: "r_addr".into(),
            realtor_email: "r_email".into(),
            realtor_photo: None,
            logos: vec![],
            property_images: vec![],
            text_fields: vec!["f_title".into(), "f_price".into()],
            text_field_details: Json(details),
            img_count: 0,
            text_count: 5,
            created_at: Utc::now(),
        };
        let templates = vec![
            template("a", vec![limited("f_title", 40)]),
            template("b", vec![limited("f_title", 25), limited("f_price", 12)]),
        ];

        assert_eq!(
            requested_fields(&templates),
            vec![limited("f_title", 25), limited("f_price", 12)]
        );
    }

    #[tokio::test]
    async fn overlong_limited_field_is_shortened_by_the_model() {
        let ai = MockAI::new()
            .with_response(r#"{"f_title": "Stunning and very spacious craftsman bungalow", "f_price": "$450,000"}"#)
            .with_response("Craftsman bungalow");

        let extracted = extract_fields(&ai, &[limited("f_title", 20), TextFieldSpec::named("f_price")], "text", 100)
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 2);
        assert!(ai.calls()[1].contains("at most 20 characters"));
        assert_eq!(extracted.get("f_title"), Some("Craftsman bungalow"));
        assert_eq!(extracted.get("f_price"), Some("$450,000"));
    }

    #[tokio::test]
    async fn shortened_value_still_too_long_is_cut() {
        let ai = MockAI::new()
            .with_response(r#"{"f_title": "Stunning and very spacious craftsman bungalow"}"#)
            .with_response("Spacious craftsman bungalow");

        let extracted = extract_fields(&ai, &[limited("f_title", 8)], "text", 100).await.unwrap();

        assert_eq!(extracted.get("f_title"), Some("Spacious…"));
    }

    #[tokio::test]
    async fn unlimited_fields_use_the_default_cut_without_extra_calls() {
        let long = "x".repeat(120);
        let ai = MockAI::new().with_json_response(&serde_json::json!({ "f_body": long }));

        let extracted = extract_fields(&ai, &fields(&["f_body"]), "text", 100).await.unwrap();

        assert_eq!(ai.call_count(), 1);
        assert_eq!(extracted.get("f_body").unwrap().chars().count(), 101);
    }

    #[tokio::test]
    async fn extract_fields_calls_ai_once() {
        let ai = MockAI::new().with_response(r#"{"f_title": "Townhouse", "f_price": "$450,000"}"#);

        let extracted = extract_fields(&ai, &fields(&["f_title", "f_price"]), "listing text", 100)
            .await
            .unwrap();

        assert_eq!(ai.call_count(), 1);
        assert!(ai.last_prompt().unwrap().contains("listing text"));
        assert_eq!(extracted.get("f_price"), Some("$450,000"));
    }

    #[tokio::test]
    async fn extract_fields_skips_call_without_fields_or_text() {
        let ai = MockAI::new();

        let none_requested = extract_fields(&ai, &[], "listing text", 100).await.unwrap();
        let blank_text = extract_fields(&ai, &fields(&["f_title"]), "   ", 100).await.unwrap();

        assert!(none_requested.is_empty());
        assert!(blank_text.is_empty());
        assert_eq!(ai.call_count(), 0);
    }

    #[tokio::test]
    async fn extract_fields_surfaces_ai_failure() {
        let ai = MockAI::failing("rate limited");

        let err = extract_fields(&ai, &fields(&["f_title"]), "listing text", 100)
            .await
            .unwrap_err();
        assert!(format!("{:#}", err).contains("rate limited"));
    }
}
