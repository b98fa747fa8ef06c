//! Geocoding collaborator: contract, HTTP adapter and cache producers.

use crate::core::geo::LatLng;
use crate::services::{cache::Producer, HTTP_CLIENT};
use crate::{MapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One autocomplete candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub label: String,
    pub coordinate: LatLng,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Human-readable address for a coordinate
    async fn reverse(&self, coord: LatLng) -> Result<String>;

    /// Best match for a free-text query, `None` when nothing matches
    async fn forward(&self, query: &str) -> Result<Option<LatLng>>;

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>>;
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    async fn reverse(&self, coord: LatLng) -> Result<String> {
        (**self).reverse(coord).await
    }

    async fn forward(&self, query: &str) -> Result<Option<LatLng>> {
        (**self).forward(query).await
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        (**self).suggest(query, limit).await
    }
}

/// Nominatim-compatible HTTP geocoder
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    base_url: String,
    language: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            language: None,
        }
    }

    pub fn openstreetmap() -> Self {
        Self::new("https://nominatim.openstreetmap.org")
    }

    /// Preferred result language, sent as `accept-language`
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let request = HTTP_CLIENT
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(&[("format", "jsonv2")]);
        match &self.language {
            Some(language) => request.query(&[("accept-language", language.as_str())]),
            None => request,
        }
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let hits = self
            .request("search")
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .await?
            .error_for_status()?
            .json::<Vec<SearchHit>>()
            .await?;
        Ok(hits)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn reverse(&self, coord: LatLng) -> Result<String> {
        let response = self
            .request("reverse")
            .query(&[("lat", coord.lat), ("lon", coord.lng)])
            .send()
            .await?
            .error_for_status()?
            .json::<ReverseResponse>()
            .await?;
        response.into_address()
    }

    async fn forward(&self, query: &str) -> Result<Option<LatLng>> {
        let hits = self.search(query, 1).await?;
        Ok(hits.into_iter().find_map(|hit| hit.into_suggestion()).map(|s| s.coordinate))
    }

    async fn suggest(&self, query: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let hits = self.search(query, limit).await?;
        Ok(hits.into_iter().filter_map(SearchHit::into_suggestion).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl ReverseResponse {
    fn into_address(self) -> Result<String> {
        match (self.display_name, self.error) {
            (Some(name), _) if !name.is_empty() => Ok(name),
            (_, Some(error)) => Err(MapError::ProviderUnavailable(error)),
            _ => Err(MapError::ProviderUnavailable("empty reverse geocode".to_string())),
        }
    }
}

/// Nominatim returns coordinates as strings
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    display_name: String,
}

impl SearchHit {
    fn into_suggestion(self) -> Option<Suggestion> {
        let coordinate = LatLng::new(self.lat.parse().ok()?, self.lon.parse().ok()?);
        coordinate.is_valid().then_some(Suggestion {
            label: self.display_name,
            coordinate,
        })
    }
}

/// Fallback address: the coordinate itself
pub fn format_coordinate(coord: &LatLng) -> String {
    format!("{:.5}, {:.5}", coord.lat, coord.lng)
}

fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn validate_query(query: &str) -> Result<()> {
    if query.trim().is_empty() {
        Err(MapError::InvalidInput("empty query".to_string()))
    } else {
        Ok(())
    }
}

/// Coordinate → address, keyed by the coordinate rounded to `precision` places
pub struct ReverseGeocode<G> {
    geocoder: G,
    precision: u32,
}

impl<G: Geocoder> ReverseGeocode<G> {
    pub fn new(geocoder: G, precision: u32) -> Self {
        Self {
            geocoder,
            precision,
        }
    }
}

#[async_trait]
impl<G: Geocoder> Producer for ReverseGeocode<G> {
    type Query = LatLng;
    type Key = (i64, i64);
    type Value = String;

    fn cache_key(&self, query: &LatLng) -> (i64, i64) {
        query.quantize(self.precision)
    }

    fn validate(&self, query: &LatLng) -> Result<()> {
        if query.is_valid() {
            Ok(())
        } else {
            Err(MapError::InvalidInput(format!("{:?}", query)))
        }
    }

    async fn fetch(&self, query: &LatLng) -> Result<String> {
        self.geocoder.reverse(*query).await
    }

    fn fallback(&self, query: &LatLng) -> String {
        format_coordinate(query)
    }
}

/// Free text → coordinate
pub struct ForwardGeocode<G> {
    geocoder: G,
}

impl<G: Geocoder> ForwardGeocode<G> {
    pub fn new(geocoder: G) -> Self {
        Self { geocoder }
    }
}

#[async_trait]
impl<G: Geocoder> Producer for ForwardGeocode<G> {
    type Query = str;
    type Key = String;
    type Value = Option<LatLng>;

    fn cache_key(&self, query: &str) -> String {
        normalize_query(query)
    }

    fn validate(&self, query: &str) -> Result<()> {
        validate_query(query)
    }

    async fn fetch(&self, query: &str) -> Result<Option<LatLng>> {
        self.geocoder.forward(query.trim()).await
    }

    fn fallback(&self, _query: &str) -> Option<LatLng> {
        None
    }
}

/// Free text → up to `limit` candidates
pub struct Suggest<G> {
    geocoder: G,
    limit: usize,
}

impl<G: Geocoder> Suggest<G> {
    pub fn new(geocoder: G, limit: usize) -> Self {
        Self { geocoder, limit }
    }
}

#[async_trait]
impl<G: Geocoder> Producer for Suggest<G> {
    type Query = str;
    type Key = String;
    type Value = Vec<Suggestion>;

    fn cache_key(&self, query: &str) -> String {
        normalize_query(query)
    }

    fn validate(&self, query: &str) -> Result<()> {
        validate_query(query)
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Suggestion>> {
        self.geocoder.suggest(query.trim(), self.limit).await
    }

    fn fallback(&self, _query: &str) -> Vec<Suggestion> {
        Vec::new()
    }
}
