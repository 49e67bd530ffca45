use std::env;

pub mod client;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod parse;
pub mod query;
pub mod selection;

pub fn api_base_url() -> String {
    env::var("PROXYDECK_API_URL").unwrap_or("http://localhost:8080".into())
}

pub fn api_token() -> Option<String> {
    env::var("PROXYDECK_API_TOKEN").ok()
}
