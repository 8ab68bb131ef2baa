pub use super::api_tokens::Entity as ApiTokens;
pub use super::features::Entity as Features;
