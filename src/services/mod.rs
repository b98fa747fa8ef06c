//! Throttled, cached access to the geocoding and routing collaborators.

pub mod cache;
pub mod geocoding;
pub mod limiter;
pub mod routing;

use once_cell::sync::Lazy;
use reqwest::Client;

// Re-exports for convenience
pub use cache::{CacheEntry, FifoStore, Producer, ThrottledCache};
pub use geocoding::{ForwardGeocode, Geocoder, NominatimGeocoder, ReverseGeocode, Suggest, Suggestion};
pub use limiter::RateLimiter;
pub use routing::{OsrmRouter, Route, RouteProducer, Router};

/// Shared async HTTP client with a custom User-Agent so that public
/// geocoding servers don't reject the request. Building the client once
/// avoids TLS and connection pool setup for every call.
pub(crate) static HTTP_CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .user_agent(concat!("ridemap/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .unwrap_or_default()
});
