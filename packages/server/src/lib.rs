// Listing Template Service - API Core
//
// Accepts a realtor's listing text and photos, extracts fields with an LLM,
// classifies photos with a vision model and fills the best-fitting stored
// document template.

pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
