pub mod activities;
pub mod data;
pub mod matcher;
pub mod models;

// Re-export commonly used types
pub use activities::{register_templates, RegisterError};
pub use data::{RealtorSlots, TemplateSpec, TemplateSummary, TextFieldSpec, ValidationError};
pub use matcher::{ContentInventory, MatchError, MatchResult};
pub use models::Template;
