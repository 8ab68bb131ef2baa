pub mod feature_service;
pub mod feature_service_impl;
pub use feature_service::FeatureService;
pub use feature_service_impl::DefaultFeatureService;

pub mod token_service;
pub mod token_service_impl;
pub use token_service::TokenService;
pub use token_service_impl::DefaultTokenService;
