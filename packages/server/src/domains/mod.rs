pub mod listings;
pub mod templates;
