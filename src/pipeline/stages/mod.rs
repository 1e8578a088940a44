pub mod auth;
pub mod language;
pub mod routing;

pub use auth::AuthStage;
pub use language::{normalize_language, LanguageStage};
pub use routing::RoutingStage;
