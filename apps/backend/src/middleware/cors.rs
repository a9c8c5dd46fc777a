use actix_cors::Cors;
use actix_web::http::header;

use crate::extractors::current_player::{NAME_HEADER, SESSION_HEADER};
use crate::middleware::request_trace::TRACE_HEADER;

/// Build CORS middleware from the configured origins:
/// - Only `http(s)://` entries are kept; empty and "null" entries are ignored
/// - Only allow methods and headers the API actually uses
pub fn cors_middleware(configured: &[String]) -> Cors {
    let mut origins: Vec<&str> = configured
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .collect();

    // Fallback to localhost-only if nothing valid was configured
    if origins.is_empty() {
        origins = vec!["http://localhost:3000", "http://127.0.0.1:3000"];
    }

    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::HeaderName::from_static(SESSION_HEADER),
            header::HeaderName::from_static(NAME_HEADER),
        ])
        .expose_headers(vec![header::HeaderName::from_static(TRACE_HEADER)])
        .max_age(3600);

    for origin in origins {
        cors = cors.allowed_origin(origin);
    }
    cors
}
