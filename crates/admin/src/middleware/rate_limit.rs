//! Per-IP rate limiting for sign-in endpoints using governor and `tower_governor`.

use std::net::IpAddr;
use std::sync::Arc;

use axum::http::Request;
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Key extractor for the client address behind Cloudflare and Fly.io.
///
/// Order: `CF-Connecting-IP`, first hop of `X-Forwarded-For`, `X-Real-IP`,
/// `Fly-Client-IP`.
#[derive(Clone, Copy)]
pub struct CloudflareIpKeyExtractor;

fn header_ip<T>(req: &Request<T>, name: &str) -> Option<IpAddr> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
}

impl tower_governor::key_extractor::KeyExtractor for CloudflareIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        ["cf-connecting-ip", "x-forwarded-for", "x-real-ip", "fly-client-ip"]
            .into_iter()
            .find_map(|name| header_ip(req, name))
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<CloudflareIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Rate limiter for sign-in, sign-up and reset POSTs: ~5 requests per minute per IP.
///
/// 1 request every 12 seconds, burst of 5. Sign-in links and reset emails
/// cost a send each, so this is stricter than the storefront forms.
///
/// # Panics
///
/// Never panics: `per_second(12)` and `burst_size(5)` are valid positive values.
#[must_use]
pub fn auth_rate_limiter() -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(CloudflareIpKeyExtractor)
        .per_second(12)
        .burst_size(5)
        .finish()
        .expect("rate limiter config with per_second(12) and burst_size(5) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(headers: &[(&str, &str)]) -> Request<()> {
        let mut builder = Request::builder().uri("/auth/login");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_header_precedence() {
        let req = request(&[
            ("x-real-ip", "192.0.2.1"),
            ("x-forwarded-for", "198.51.100.4, 10.0.0.2"),
        ]);
        let ip = CloudflareIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "198.51.100.4".parse::<IpAddr>().unwrap());

        let req = request(&[("cf-connecting-ip", "203.0.113.7"), ("x-real-ip", "192.0.2.1")]);
        let ip = CloudflareIpKeyExtractor.extract(&req).unwrap();
        assert_eq!(ip, "203.0.113.7".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_missing_headers_rejected() {
        assert!(CloudflareIpKeyExtractor.extract(&request(&[])).is_err());
        let req = request(&[("x-forwarded-for", "not-an-ip")]);
        assert!(CloudflareIpKeyExtractor.extract(&req).is_err());
    }
}
