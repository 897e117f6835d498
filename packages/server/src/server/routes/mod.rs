// HTTP routes
pub mod health;
pub mod select;
pub mod templates;

pub use health::*;
pub use select::*;
pub use templates::*;
