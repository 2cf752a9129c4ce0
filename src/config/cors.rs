use axum::http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::handlers::events::TOTAL_COUNT_HEADER;

const PREFLIGHT_MAX_AGE_SECS: u64 = 86400;

pub fn create_cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([
            header::CONTENT_LENGTH,
            header::CONTENT_TYPE,
            HeaderName::from_static(TOTAL_COUNT_HEADER),
        ])
        .max_age(std::time::Duration::from_secs(PREFLIGHT_MAX_AGE_SECS));

    // Credentials are only legal alongside an explicit origin list.
    match allowed_origins(origins) {
        Some(list) => layer.allow_origin(list).allow_credentials(true),
        None => layer.allow_origin(AllowOrigin::any()),
    }
}

fn allowed_origins(origins: &[String]) -> Option<AllowOrigin> {
    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => {
                tracing::debug!("CORS: Allowing origin: {}", origin);
                Some(value)
            }
            Err(e) => {
                tracing::warn!("CORS: Invalid origin '{}': {}", origin, e);
                None
            }
        })
        .collect();

    if parsed.is_empty() {
        tracing::warn!("CORS: No valid origins configured, allowing any origin without credentials");
        None
    } else {
        tracing::info!("CORS: Configured with {} allowed origin(s)", parsed.len());
        Some(AllowOrigin::list(parsed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_CORS_ORIGINS;

    #[test]
    fn test_default_origins_are_valid() {
        let defaults: Vec<String> = DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect();
        assert!(allowed_origins(&defaults).is_some());
    }

    #[test]
    fn test_invalid_origins_are_skipped() {
        let origins = vec!["bad\norigin".to_string()];
        assert!(allowed_origins(&origins).is_none());
        // Falls back to a wildcard layer without panicking.
        let _layer = create_cors_layer(&origins);
    }
}
