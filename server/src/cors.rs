use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, Cors, CorsOptions};
use tracing::error;

use crate::config::env_or;

pub fn create_cors() -> Option<Cors> {
    let origins: String = env_or(
        "BUGBASH_CORS_ALLOWED_ORIGINS",
        "http://localhost:5173".to_string(),
    );
    let origins: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();

    let options = CorsOptions {
        allowed_origins: AllowedOrigins::some_exact(&origins),
        allowed_methods: [Method::Get, Method::Post, Method::Options]
            .into_iter()
            .map(Into::into)
            .collect(),
        allowed_headers: AllowedHeaders::some(&["Accept", "Content-Type"]),
        ..Default::default()
    };

    match options.to_cors() {
        Ok(cors) => Some(cors),
        Err(e) => {
            error!("Invalid CORS configuration, serving without CORS: {}", e);
            None
        }
    }
}
