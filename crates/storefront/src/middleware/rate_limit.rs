//! Per-IP rate limiting for form endpoints using governor and `tower_governor`.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor that prefers Cloudflare's `CF-Connecting-IP`, then the
/// standard proxy headers, then Fly.io's `Fly-Client-IP`.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

const IP_HEADERS: [&str; 3] = ["cf-connecting-ip", "x-real-ip", "fly-client-ip"];

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        let headers = req.headers();
        let header_ip = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<IpAddr>().ok())
        };

        if let Some(ip) = header_ip("cf-connecting-ip") {
            return Ok(ip);
        }

        // First hop of X-Forwarded-For is the client.
        if let Some(ip) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return Ok(ip);
        }

        IP_HEADERS
            .iter()
            .skip(1)
            .find_map(|name| header_ip(name))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for public form POSTs: ~10 requests per minute per IP.
///
/// 1 request every 6 seconds, burst of 5. The session cooldown handles the
/// polite case; this catches clients that drop their cookie.
///
/// # Panics
///
/// Never panics: `per_second(6)` and `burst_size(5)` are valid positive values.
#[must_use]
pub fn form_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(6)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(6) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}
