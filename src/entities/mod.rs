pub mod prelude;

pub mod api_tokens;
pub mod features;
