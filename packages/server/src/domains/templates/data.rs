//! Template upload payloads and their validation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use thiserror::Error;

use super::models::Template;

/// Number of realtor text slots every template carries (name, address, email)
pub const REALTOR_TEXT_SLOTS: usize = 3;

const REQUIRED_KEYS: &[&str] = &[
    "template_name",
    "realtor",
    "logos",
    "property_images",
    "text_fields",
];
const REQUIRED_REALTOR_KEYS: &[&str] = &["name", "address", "email"];
const IMAGE_SLOT_KEYS: &[&str] = &["logos", "property_images"];
const SLOT_LIST_KEYS: &[&str] = &["logos", "property_images", "text_fields"];

/// Slot names for the realtor's contact details
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtorSlots {
    pub name: String,
    pub address: String,
    pub email: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// A text slot. Uploaded either as a bare name or as
/// `{"name", "approx_length", "format"}`; bare names serialize back as strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "TextFieldEntry", into = "TextFieldEntry")]
pub struct TextFieldSpec {
    pub name: String,
    /// Upper bound on the value length, in characters
    pub approx_length: Option<u32>,
    /// Example of the expected shape, e.g. "3 BED | 2 BATH"
    pub format: Option<String>,
}

impl TextFieldSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            approx_length: None,
            format: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TextFieldEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        approx_length: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
}

impl From<TextFieldEntry> for TextFieldSpec {
    fn from(entry: TextFieldEntry) -> Self {
        match entry {
            TextFieldEntry::Name(name) => TextFieldSpec::named(name),
            TextFieldEntry::Detailed {
                name,
                approx_length,
                format,
            } => TextFieldSpec {
                name,
                approx_length,
                format,
            },
        }
    }
}

impl From<TextFieldSpec> for TextFieldEntry {
    fn from(spec: TextFieldSpec) -> Self {
        match (spec.approx_length, spec.format) {
            (None, None) => TextFieldEntry::Name(spec.name),
            (approx_length, format) => TextFieldEntry::Detailed {
                name: spec.name,
                approx_length,
                format,
            },
        }
    }
}

/// One template as uploaded to `/upload-template/`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TemplateSpec {
    pub template_name: String,
    pub realtor: RealtorSlots,
    pub logos: Vec<String>,
    pub property_images: Vec<String>,
    pub text_fields: Vec<TextFieldSpec>,
}

impl TemplateSpec {
    pub fn img_count(&self) -> usize {
        self.property_images.len() + self.logos.len() + usize::from(self.realtor.photo.is_some())
    }

    pub fn text_count(&self) -> usize {
        self.text_fields.len() + REALTOR_TEXT_SLOTS
    }

    pub fn text_field_names(&self) -> Vec<String> {
        self.text_fields.iter().map(|f| f.name.clone()).collect()
    }
}

impl From<&Template> for TemplateSpec {
    fn from(template: &Template) -> Self {
        Self {
            template_name: template.name.clone(),
            realtor: RealtorSlots {
                name: template.realtor_name.clone(),
                address: template.realtor_address.clone(),
                email: template.realtor_email.clone(),
                photo: template.realtor_photo.clone(),
            },
            logos: template.logos.clone(),
            property_images: template.property_images.clone(),
            text_fields: template.text_field_specs(),
        }
    }
}

/// Stored template as returned by `GET /templates/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateSummary {
    #[serde(flatten)]
    pub spec: TemplateSpec,
    pub img_count: i32,
    pub text_count: i32,
}

impl From<&Template> for TemplateSummary {
    fn from(template: &Template) -> Self {
        Self {
            spec: TemplateSpec::from(template),
            img_count: template.img_count,
            text_count: template.text_count,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Why an upload payload was rejected.
///
/// `missing` holds JSON paths of absent keys (e.g. `[0].realtor.email`),
/// `problems` everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", summarize(.missing, .problems))]
pub struct ValidationError {
    pub missing: Vec<String>,
    pub problems: Vec<String>,
}

impl ValidationError {
    fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.problems.is_empty()
    }
}

fn summarize(missing: &[String], problems: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing keys: {}", missing.join(", ")));
    }
    parts.extend(problems.iter().cloned());
    parts.join("; ")
}

/// Validate an upload payload (one object or an array of objects).
///
/// The whole batch is checked before anything is returned so callers see
/// every problem at once.
pub fn parse_template_specs(payload: Value) -> Result<Vec<TemplateSpec>, ValidationError> {
    let items = match payload {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => {
            return Err(ValidationError {
                problems: vec!["expected a JSON object or an array of objects".to_string()],
                ..Default::default()
            })
        }
    };

    let mut errors = ValidationError::default();
    if items.is_empty() {
        errors.problems.push("no templates given".to_string());
    }

    for (index, item) in items.iter().enumerate() {
        match item {
            Value::Object(map) => check_template(index, map, &mut errors),
            _ => errors.problems.push(format!("[{}]: expected a JSON object", index)),
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    let specs = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<TemplateSpec>(item).map_err(|e| ValidationError {
                problems: vec![format!("[{}]: {}", index, e)],
                ..Default::default()
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut seen = HashSet::new();
    for spec in &specs {
        if !seen.insert(spec.template_name.as_str()) {
            errors.problems.push(format!(
                "template name '{}' appears more than once",
                spec.template_name
            ));
        }
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(specs)
}

fn check_template(index: usize, map: &Map<String, Value>, errors: &mut ValidationError) {
    for key in REQUIRED_KEYS {
        if !map.contains_key(*key) {
            errors.missing.push(format!("[{}].{}", index, key));
        }
    }

    if let Some(name) = map.get("template_name") {
        check_non_empty_string(&format!("[{}].template_name", index), name, errors);
    }

    match map.get("realtor") {
        Some(Value::Object(realtor)) => {
            for key in REQUIRED_REALTOR_KEYS {
                match realtor.get(*key) {
                    Some(value) => check_non_empty_string(
                        &format!("[{}].realtor.{}", index, key),
                        value,
                        errors,
                    ),
                    None => errors.missing.push(format!("[{}].realtor.{}", index, key)),
                }
            }
            match realtor.get("photo") {
                None | Some(Value::Null) => {}
                Some(value) => {
                    check_non_empty_string(&format!("[{}].realtor.photo", index), value, errors)
                }
            }
        }
        Some(_) => errors
            .problems
            .push(format!("[{}].realtor: expected an object", index)),
        None => {}
    }

    for key in IMAGE_SLOT_KEYS {
        match map.get(*key) {
            Some(Value::Array(slots)) => {
                for (slot_index, slot) in slots.iter().enumerate() {
                    check_non_empty_string(
                        &format!("[{}].{}[{}]", index, key, slot_index),
                        slot,
                        errors,
                    );
                }
            }
            Some(_) => errors
                .problems
                .push(format!("[{}].{}: expected an array of strings", index, key)),
            None => {}
        }
    }

    match map.get("text_fields") {
        Some(Value::Array(fields)) => {
            for (field_index, field) in fields.iter().enumerate() {
                check_text_field(&format!("[{}].text_fields[{}]", index, field_index), field, errors);
            }
        }
        Some(_) => errors
            .problems
            .push(format!("[{}].text_fields: expected an array", index)),
        None => {}
    }

    check_unique_slot_names(index, map, errors);
}

/// A text field is a name, or an object with a name and optional
/// `approx_length` (positive integer) and `format` (string).
fn check_text_field(path: &str, value: &Value, errors: &mut ValidationError) {
    let Value::Object(field) = value else {
        check_non_empty_string(path, value, errors);
        return;
    };

    match field.get("name") {
        Some(name) => check_non_empty_string(&format!("{}.name", path), name, errors),
        None => errors.missing.push(format!("{}.name", path)),
    }
    match field.get("approx_length") {
        None | Some(Value::Null) => {}
        Some(Value::Number(n)) if n.as_u64().is_some_and(|n| n > 0 && n <= u32::MAX as u64) => {}
        Some(_) => errors
            .problems
            .push(format!("{}.approx_length: expected a positive integer", path)),
    }
    match field.get("format") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => errors
            .problems
            .push(format!("{}.format: expected a string", path)),
    }
}

fn check_non_empty_string(path: &str, value: &Value, errors: &mut ValidationError) {
    match value {
        Value::String(s) if !s.trim().is_empty() => {}
        Value::String(_) => errors.problems.push(format!("{}: must not be empty", path)),
        _ => errors.problems.push(format!("{}: expected a string", path)),
    }
}

fn check_unique_slot_names(index: usize, map: &Map<String, Value>, errors: &mut ValidationError) {
    let realtor_slots = map
        .get("realtor")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|realtor| {
            ["name", "address", "email", "photo"]
                .into_iter()
                .filter_map(move |key| realtor.get(key))
        });
    let list_slots = SLOT_LIST_KEYS
        .iter()
        .filter_map(|key| map.get(*key).and_then(Value::as_array))
        .flatten()
        .map(|slot| slot.get("name").unwrap_or(slot));

    let mut seen = HashSet::new();
    for name in realtor_slots.chain(list_slots).filter_map(Value::as_str) {
        if !seen.insert(name) {
            errors.problems.push(format!(
                "[{}]: slot name '{}' is used more than once",
                index, name
            ));
        }
    }
}
