//! Fetch strategy classification for the offline layer.
//!
//! The host's network interceptor (a service worker on the web) forwards
//! each request here and applies the returned strategy. Classification is
//! pure: no I/O, no state beyond the configured application origin.

use serde::{Deserialize, Serialize};

/// Font CDNs allowed through despite being cross-origin.
const FONT_HOSTS: [&str; 2] = ["fonts.googleapis.com", "fonts.gstatic.com"];

/// Path prefixes that must never be served from a cache.
const API_PREFIXES: [&str; 2] = ["/api/", "/v1/"];

/// Media file extensions routed to the media cache.
const MEDIA_EXTENSIONS: [&str; 7] = ["mp3", "mp4", "m4a", "wav", "ogg", "flac", "webm"];

/// Route taken when the application shell document cannot be fetched.
pub const SHELL_ROUTE: &str = "/";

/// What the requester intends to do with the response, mirroring the
/// web platform's request destinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestDestination {
    Document,
    Style,
    Script,
    Font,
    Image,
    Audio,
    Video,
    Other,
}

/// A network request as seen by the interceptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRequest {
    /// HTTP method, uppercase.
    pub method: String,
    /// Absolute request URL.
    pub url: String,
    pub destination: RequestDestination,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>, destination: RequestDestination) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.into(),
            destination,
        }
    }
}

/// How the interceptor should satisfy a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FetchStrategy {
    /// Hand the request to the network untouched, no caching.
    Passthrough,
    /// Network only; a failure is the caller's problem. Responses are
    /// never cached.
    NetworkOnly,
    /// Serve from cache when present, else fetch and cache.
    CacheFirst,
    /// Serve from the media cache when present; on a miss, fetch and
    /// repopulate the media cache off-path.
    MediaCacheFirst,
    /// Try the network, fall back to the cached copy, and finally to the
    /// application shell route.
    NetworkFirst { fallback: String },
    /// Try the network, fall back to the cached copy if any.
    NetworkFallback,
}

/// Stateless request classifier bound to the application origin.
#[derive(Debug, Clone)]
pub struct RequestClassifier {
    origin: String,
}

impl RequestClassifier {
    /// `origin` is scheme + host + optional port, no trailing slash.
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    pub fn classify(&self, request: &FetchRequest) -> FetchStrategy {
        if request.method != "GET" {
            return FetchStrategy::Passthrough;
        }

        let same_origin = request.url.starts_with(&self.origin);
        if !same_origin {
            let allowed_font = host_of(&request.url)
                .map(|host| FONT_HOSTS.contains(&host))
                .unwrap_or(false);
            if !allowed_font {
                return FetchStrategy::Passthrough;
            }
            return FetchStrategy::CacheFirst;
        }

        let path = path_of(&request.url);
        if API_PREFIXES.iter().any(|p| path.starts_with(p)) {
            return FetchStrategy::NetworkOnly;
        }

        if matches!(
            request.destination,
            RequestDestination::Audio | RequestDestination::Video
        ) || has_media_extension(path)
        {
            return FetchStrategy::MediaCacheFirst;
        }

        match request.destination {
            RequestDestination::Style
            | RequestDestination::Script
            | RequestDestination::Font
            | RequestDestination::Image => FetchStrategy::CacheFirst,
            RequestDestination::Document => FetchStrategy::NetworkFirst {
                fallback: SHELL_ROUTE.to_string(),
            },
            _ => FetchStrategy::NetworkFallback,
        }
    }
}

/// Host portion of an absolute URL, without port.
fn host_of(url: &str) -> Option<&str> {
    let rest = url.split("://").nth(1)?;
    let authority = rest.split('/').next()?;
    Some(authority.split(':').next().unwrap_or(authority))
}

/// Path portion of an absolute URL, query stripped.
fn path_of(url: &str) -> &str {
    let Some(rest) = url.split("://").nth(1) else {
        return url;
    };
    let path = match rest.find('/') {
        Some(i) => &rest[i..],
        None => "/",
    };
    path.split('?').next().unwrap_or(path)
}

fn has_media_extension(path: &str) -> bool {
    path.rsplit('.')
        .next()
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            MEDIA_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RequestClassifier {
        RequestClassifier::new("https://app.example.com")
    }

    #[test]
    fn non_get_passes_through() {
        let mut request = FetchRequest::get(
            "https://app.example.com/api/upload",
            RequestDestination::Other,
        );
        request.method = "POST".to_string();
        assert_eq!(classifier().classify(&request), FetchStrategy::Passthrough);
    }

    #[test]
    fn cross_origin_passes_through_except_font_hosts() {
        let foreign = FetchRequest::get("https://cdn.other.com/lib.js", RequestDestination::Script);
        assert_eq!(classifier().classify(&foreign), FetchStrategy::Passthrough);

        let fonts = FetchRequest::get(
            "https://fonts.gstatic.com/s/roboto.woff2",
            RequestDestination::Font,
        );
        assert_eq!(classifier().classify(&fonts), FetchStrategy::CacheFirst);
    }

    #[test]
    fn api_prefixes_are_network_only() {
        for url in [
            "https://app.example.com/api/tables",
            "https://app.example.com/v1/media?page=2",
        ] {
            let request = FetchRequest::get(url, RequestDestination::Other);
            assert_eq!(classifier().classify(&request), FetchStrategy::NetworkOnly);
        }
    }

    #[test]
    fn media_requests_use_the_media_cache() {
        let by_destination = FetchRequest::get(
            "https://app.example.com/stream/abc",
            RequestDestination::Audio,
        );
        assert_eq!(
            classifier().classify(&by_destination),
            FetchStrategy::MediaCacheFirst
        );

        let by_extension = FetchRequest::get(
            "https://app.example.com/uploads/track.FLAC",
            RequestDestination::Other,
        );
        assert_eq!(
            classifier().classify(&by_extension),
            FetchStrategy::MediaCacheFirst
        );
    }

    #[test]
    fn static_assets_are_cache_first() {
        for destination in [
            RequestDestination::Style,
            RequestDestination::Script,
            RequestDestination::Font,
            RequestDestination::Image,
        ] {
            let request = FetchRequest::get("https://app.example.com/assets/x", destination);
            assert_eq!(classifier().classify(&request), FetchStrategy::CacheFirst);
        }
    }

    #[test]
    fn documents_are_network_first_with_shell_fallback() {
        let request = FetchRequest::get(
            "https://app.example.com/library",
            RequestDestination::Document,
        );
        assert_eq!(
            classifier().classify(&request),
            FetchStrategy::NetworkFirst {
                fallback: "/".to_string()
            }
        );
    }

    #[test]
    fn everything_else_is_network_fallback() {
        let request = FetchRequest::get(
            "https://app.example.com/manifest.json",
            RequestDestination::Other,
        );
        assert_eq!(
            classifier().classify(&request),
            FetchStrategy::NetworkFallback
        );
    }

    #[test]
    fn query_strings_do_not_confuse_extension_matching() {
        let request = FetchRequest::get(
            "https://app.example.com/uploads/a.mp3?token=x.bin",
            RequestDestination::Other,
        );
        assert_eq!(
            classifier().classify(&request),
            FetchStrategy::MediaCacheFirst
        );
    }
}
