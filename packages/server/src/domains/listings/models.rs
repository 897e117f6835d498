use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::kernel::ImageInput;

/// Category a photo is sorted into before slot assignment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImageCategory {
    House,
    Person,
    Logo,
}

impl fmt::Display for ImageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageCategory::House => write!(f, "house"),
            ImageCategory::Person => write!(f, "person"),
            ImageCategory::Logo => write!(f, "logo"),
        }
    }
}

/// An uploaded image plus the label the vision model gave it.
/// Lives only for the duration of one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClassifiedImage {
    /// Filename or URL as submitted
    pub reference: String,
    pub label: String,
    pub score: f32,
    pub category: ImageCategory,
}

/// Field name -> extracted value for one listing. Fields the model could
/// not find are absent rather than empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ExtractedFields(BTreeMap<String, String>);

impl ExtractedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ExtractedFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Contact details submitted alongside every listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RealtorContact {
    pub name: String,
    pub email: String,
    pub address: String,
}

/// Everything a caller submits to have a template filled
#[derive(Debug, Clone)]
pub struct ListingSubmission {
    pub text: String,
    /// In upload order
    pub images: Vec<ImageInput>,
    pub realtor: RealtorContact,
}
