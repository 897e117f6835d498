pub mod activities;
pub mod classification;
pub mod extraction;
pub mod models;

// Re-export commonly used types
pub use activities::{compose_listing, ComposeError, ComposedListing};
pub use models::{
    ClassifiedImage, ExtractedFields, ImageCategory, ListingSubmission, RealtorContact,
};
