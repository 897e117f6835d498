//! Template matching.
//!
//! A template is eligible when every counted category (property images,
//! logos, text fields) has at least as much content available as the
//! template has slots. Text is counted by name: only extracted values for
//! the template's own text slots are available to it. Among eligible
//! templates the one leaving the least content unused wins; equal gaps go
//! to the template declared first.
//!
//! The realtor photo slot is optional: it is filled when a person photo was
//! submitted and left empty otherwise, so it never affects eligibility.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use super::models::Template;
use crate::domains::listings::models::{
    ClassifiedImage, ExtractedFields, ImageCategory, RealtorContact,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("no matching template")]
    NoMatchingTemplate,
}

/// How much content of each kind a submission brings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentInventory {
    pub property_images: usize,
    pub logos: usize,
    pub realtor_photos: usize,
    /// Names of the text fields that were extracted
    pub text_fields: BTreeSet<String>,
}

impl ContentInventory {
    pub fn from_content(images: &[ClassifiedImage], fields: &ExtractedFields) -> Self {
        let count = |category| images.iter().filter(|i| i.category == category).count();
        Self {
            property_images: count(ImageCategory::House),
            logos: count(ImageCategory::Logo),
            realtor_photos: count(ImageCategory::Person),
            text_fields: fields.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }

    /// How many of `template`'s text slots have an extracted value
    pub fn text_fields_for(&self, template: &Template) -> usize {
        template
            .text_fields
            .iter()
            .filter(|name| self.text_fields.contains(name.as_str()))
            .count()
    }

    /// Content `template` could put into its slots
    pub fn usable_by(&self, template: &Template) -> usize {
        self.property_images + self.logos + self.text_fields_for(template)
    }
}

/// Per-category amount a template asks for beyond what is available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Shortfall {
    pub property_images: usize,
    pub logos: usize,
    pub text_fields: usize,
}

impl Shortfall {
    pub fn is_none(&self) -> bool {
        self.property_images == 0 && self.logos == 0 && self.text_fields == 0
    }
}

/// How one template fares against a submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreCard {
    pub template_name: String,
    pub shortfall: Shortfall,
    /// Unused content when the template is eligible
    pub gap: Option<usize>,
}

impl ScoreCard {
    pub fn is_eligible(&self) -> bool {
        self.gap.is_some()
    }
}

pub fn score_template(template: &Template, inventory: &ContentInventory) -> ScoreCard {
    let shortfall = Shortfall {
        property_images: template
            .property_images
            .len()
            .saturating_sub(inventory.property_images),
        logos: template.logos.len().saturating_sub(inventory.logos),
        text_fields: template.text_fields.len() - inventory.text_fields_for(template),
    };
    let gap = shortfall
        .is_none()
        .then(|| inventory.usable_by(template) - template.slot_total());

    ScoreCard {
        template_name: template.name.clone(),
        shortfall,
        gap,
    }
}

/// Score cards for `templates`, in declaration order.
pub fn score_templates(templates: &[Template], inventory: &ContentInventory) -> Vec<ScoreCard> {
    templates
        .iter()
        .map(|t| score_template(t, inventory))
        .collect()
}

/// Pick the best eligible template. `templates` must be in declaration order.
pub fn select_template<'a>(
    templates: &'a [Template],
    inventory: &ContentInventory,
) -> Result<&'a Template, MatchError> {
    // min_by_key keeps the first of equal minima, which is the earlier template
    templates
        .iter()
        .filter_map(|t| score_template(t, inventory).gap.map(|gap| (t, gap)))
        .min_by_key(|(_, gap)| *gap)
        .map(|(t, _)| t)
        .ok_or(MatchError::NoMatchingTemplate)
}

/// A template with content poured into its slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub template_name: String,
    /// Every slot of the template; `None` where no content was available
    pub slots: BTreeMap<String, Option<String>>,
}

/// Fill `template`'s slots.
///
/// Images go to their slots in upload order, text fields by name; content
/// beyond the template's slot count is dropped.
pub fn assign_slots(
    template: &Template,
    images: &[ClassifiedImage],
    fields: &ExtractedFields,
    realtor: &RealtorContact,
) -> MatchResult {
    let mut slots = BTreeMap::new();

    let references = |category: ImageCategory| {
        images
            .iter()
            .filter(move |i| i.category == category)
            .map(|i| i.reference.clone())
    };

    fill_in_order(&mut slots, &template.property_images, references(ImageCategory::House));
    fill_in_order(&mut slots, &template.logos, references(ImageCategory::Logo));

    for name in &template.text_fields {
        slots.insert(name.clone(), fields.get(name).map(str::to_string));
    }

    slots.insert(template.realtor_name.clone(), Some(realtor.name.clone()));
    slots.insert(template.realtor_address.clone(), Some(realtor.address.clone()));
    slots.insert(template.realtor_email.clone(), Some(realtor.email.clone()));
    if let Some(photo_slot) = &template.realtor_photo {
        slots.insert(photo_slot.clone(), references(ImageCategory::Person).next());
    }

    MatchResult {
        template_name: template.name.clone(),
        slots,
    }
}

fn fill_in_order(
    slots: &mut BTreeMap<String, Option<String>>,
    slot_names: &[String],
    mut content: impl Iterator<Item = String>,
) {
    for name in slot_names {
        slots.insert(name.clone(), content.next());
    }
}

/// Select the best template and fill it.
pub fn match_template(
    templates: &[Template],
    images: &[ClassifiedImage],
    fields: &ExtractedFields,
    realtor: &RealtorContact,
) -> Result<MatchResult, MatchError> {
    let inventory = ContentInventory::from_content(images, fields);

    let mut cards = score_templates(templates, &inventory);
    cards.sort_by_key(|c| c.gap.unwrap_or(usize::MAX));
    for card in cards.iter().take(3) {
        tracing::debug!(
            template = %card.template_name,
            eligible = card.is_eligible(),
            gap = ?card.gap,
            shortfall = ?card.shortfall,
            "Template candidate"
        );
    }

    let template = select_template(templates, &inventory).map_err(|e| {
        tracing::info!(
            inventory = ?inventory,
            templates = templates.len(),
            "No template fits the submitted content"
        );
        e
    })?;

    Ok(assign_slots(template, images, fields, realtor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;
    use uuid::Uuid;

    fn template(name: &str, logos: &[&str], property: &[&str], text: &[&str]) -> Template {
        let strings = |s: &[&str]| s.iter().map(|x| x.to_string()).collect::<Vec<_>>();
        Template {
            id: Uuid::now_v7(),
            position: 0,
            name: name.to_string(),
            realtor_name: format!("{name}_r_name"),
            realtor_address: format!("{name}_r_addr"),
            realtor_email: format!("{name}_r_email"),
            realtor_photo: None,
            logos: strings(logos),
            property_images: strings(property),
            text_fields: strings(text),
            text_field_details: Json(Vec::new()),
            img_count: 0,
            text_count: 0,
            created_at: Utc::now(),
        }
    }

    fn inventory(property_images: usize, logos: usize, text_fields: &[&str]) -> ContentInventory {
        ContentInventory {
            property_images,
            logos,
            realtor_photos: 0,
            text_fields: text_fields.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn image(reference: &str, category: ImageCategory) -> ClassifiedImage {
        ClassifiedImage {
            reference: reference.to_string(),
            label: "test".to_string(),
            score: 1.0,
            category,
        }
    }

    fn realtor() -> RealtorContact {
        RealtorContact {
            name: "Jane Doe".to_string(),
            email: "jane@example.com".to_string(),
            address: "1 Main St".to_string(),
        }
    }

    #[test]
    fn never_selects_template_needing_more_than_available() {
        let templates = vec![
            template("big", &["l1"], &["p1", "p2", "p3"], &["t"]),
            template("small", &[], &["p1"], &[]),
        ];

        let text_cases: [&[&str]; 3] = [&[], &["t"], &["other"]];
        for property in 0..4 {
            for logos in 0..2 {
                for text in text_cases {
                    let inv = inventory(property, logos, text);
                    if let Ok(chosen) = select_template(&templates, &inv) {
                        assert!(chosen.property_images.len() <= property);
                        assert!(chosen.logos.len() <= logos);
                        assert!(chosen
                            .text_fields
                            .iter()
                            .all(|name| text.contains(&name.as_str())));
                    }
                }
            }
        }
    }

    #[test]
    fn prefers_smallest_gap() {
        let templates = vec![
            template("loose", &[], &["p1"], &[]),
            template("snug", &["l1"], &["p1", "p2"], &["t"]),
        ];

        let chosen = select_template(&templates, &inventory(2, 1, &["t", "other"])).unwrap();
        assert_eq!(chosen.name, "snug");
    }

    #[test]
    fn exact_tie_goes_to_first_declared() {
        let templates = vec![
            template("first", &["l1"], &["p1"], &[]),
            template("second", &[], &["p1", "p2"], &[]),
        ];

        let chosen = select_template(&templates, &inventory(2, 1, &[])).unwrap();
        assert_eq!(chosen.name, "first");
    }

    #[test]
    fn no_eligible_template_is_no_match() {
        let templates = vec![template("needs_logo", &["l1"], &[], &[])];

        assert_eq!(
            select_template(&templates, &inventory(5, 0, &["a", "b"])).unwrap_err(),
            MatchError::NoMatchingTemplate
        );
        assert_eq!(
            select_template(&[], &inventory(1, 1, &["a"])).unwrap_err(),
            MatchError::NoMatchingTemplate
        );
    }

    #[test]
    fn score_card_reports_shortfall() {
        let t = template("t", &["l1", "l2"], &["p1"], &["a", "b"]);
        let card = score_template(&t, &inventory(3, 1, &["c"]));

        assert!(!card.is_eligible());
        assert_eq!(
            card.shortfall,
            Shortfall {
                property_images: 0,
                logos: 1,
                text_fields: 2
            }
        );
    }

    #[test]
    fn inventory_counts_categories() {
        let images = vec![
            image("a.jpg", ImageCategory::House),
            image("b.png", ImageCategory::Logo),
            image("c.jpg", ImageCategory::House),
            image("d.jpg", ImageCategory::Person),
        ];
        let fields: ExtractedFields = [("f_title", "Loft")].into_iter().collect();

        let inv = ContentInventory::from_content(&images, &fields);
        assert_eq!(
            inv,
            ContentInventory {
                property_images: 2,
                logos: 1,
                realtor_photos: 1,
                text_fields: ["f_title".to_string()].into_iter().collect(),
            }
        );
    }

    #[test]
    fn text_fields_are_available_only_by_name() {
        let templates = vec![
            template("a", &[], &[], &["f_a", "f_b"]),
            template("b", &[], &[], &["f_c", "f_d", "f_e"]),
        ];
        let fields: ExtractedFields = [("f_c", "x"), ("f_d", "y")].into_iter().collect();

        let result = match_template(&templates, &[], &fields, &realtor());
        assert_eq!(result.unwrap_err(), MatchError::NoMatchingTemplate);

        let card = score_template(&templates[0], &ContentInventory::from_content(&[], &fields));
        assert_eq!(card.shortfall.text_fields, 2);
    }

    #[test]
    fn template_whose_fields_were_extracted_wins() {
        let templates = vec![
            template("a", &[], &[], &["f_a", "f_b"]),
            template("b", &[], &[], &["f_c", "f_d", "f_e"]),
        ];
        let fields: ExtractedFields = [("f_c", "x"), ("f_d", "y"), ("f_e", "z")]
            .into_iter()
            .collect();

        let result = match_template(&templates, &[], &fields, &realtor()).unwrap();
        assert_eq!(result.template_name, "b");
        assert_eq!(result.slots["f_e"].as_deref(), Some("z"));
    }

    #[test]
    fn extracted_fields_of_other_templates_do_not_widen_the_gap() {
        let templates = vec![
            template("title_only", &[], &["p1"], &["f_title"]),
            template("photos", &[], &["p1", "p2"], &[]),
        ];
        // f_price belongs to no candidate here, so it is not content either could use
        let inv = inventory(2, 0, &["f_title", "f_price"]);

        assert_eq!(score_template(&templates[0], &inv).gap, Some(1));
        assert_eq!(score_template(&templates[1], &inv).gap, Some(0));
        assert_eq!(select_template(&templates, &inv).unwrap().name, "photos");
    }

    #[test]
    fn fills_listing_scenario() {
        let mut t1 = template("t1", &["l1"], &["p1", "p2"], &["f_title", "f_price"]);
        t1.realtor_name = "r_name".into();
        t1.realtor_address = "r_addr".into();
        t1.realtor_email = "r_email".into();
        t1.realtor_photo = Some("r_photo".into());

        let images = vec![
            image("front.jpg", ImageCategory::House),
            image("logo.png", ImageCategory::Logo),
            image("kitchen.jpg", ImageCategory::House),
        ];
        let fields: ExtractedFields = [("f_title", "Sunny cottage"), ("f_price", "$350,000")]
            .into_iter()
            .collect();

        let result = match_template(&[t1], &images, &fields, &realtor()).unwrap();

        assert_eq!(result.template_name, "t1");
        let slot = |name: &str| result.slots.get(name).cloned().flatten();
        assert_eq!(slot("l1").as_deref(), Some("logo.png"));
        assert_eq!(slot("p1").as_deref(), Some("front.jpg"));
        assert_eq!(slot("p2").as_deref(), Some("kitchen.jpg"));
        assert_eq!(slot("f_title").as_deref(), Some("Sunny cottage"));
        assert_eq!(slot("f_price").as_deref(), Some("$350,000"));
        assert_eq!(slot("r_name").as_deref(), Some("Jane Doe"));
        assert_eq!(slot("r_addr").as_deref(), Some("1 Main St"));
        assert_eq!(slot("r_email").as_deref(), Some("jane@example.com"));
        assert!(result.slots.contains_key("r_photo"));
        assert_eq!(slot("r_photo"), None);
        assert_eq!(result.slots.len(), 9);
    }

    #[test]
    fn extra_content_is_dropped_and_photo_filled() {
        let mut t = template("t", &[], &["p1"], &[]);
        t.realtor_photo = Some("photo".into());
        let images = vec![
            image("agent.jpg", ImageCategory::Person),
            image("a.jpg", ImageCategory::House),
            image("b.jpg", ImageCategory::House),
            image("logo.png", ImageCategory::Logo),
        ];

        let result = assign_slots(&t, &images, &ExtractedFields::new(), &realtor());

        assert_eq!(result.slots["p1"].as_deref(), Some("a.jpg"));
        assert_eq!(result.slots["photo"].as_deref(), Some("agent.jpg"));
        assert!(!result.slots.values().flatten().any(|v| v == "b.jpg" || v == "logo.png"));
    }

    #[test]
    fn unextracted_text_slot_is_empty() {
        let t = template("t", &[], &[], &["f_title", "f_price"]);
        let fields: ExtractedFields = [("f_title", "Loft"), ("f_other", "x")].into_iter().collect();

        let result = assign_slots(&t, &[], &fields, &realtor());
        assert_eq!(result.slots["f_title"].as_deref(), Some("Loft"));
        assert_eq!(result.slots["f_price"], None);
        assert!(!result.slots.contains_key("f_other"));
    }
}
