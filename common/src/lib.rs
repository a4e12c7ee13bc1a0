pub mod env_config;
pub mod error;
pub mod feature;
pub mod http;
pub mod jwt;
pub mod stripe;
