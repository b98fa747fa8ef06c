//! Routing collaborator: contract, OSRM-style HTTP adapter and cache producer.

use crate::core::constants::FALLBACK_SPEED_MPS;
use crate::core::geo::{path_length, LatLng};
use crate::services::{cache::Producer, HTTP_CLIENT};
use crate::{MapError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub coordinates: Vec<LatLng>,
}

impl Route {
    /// Straight polyline through `waypoints` at a nominal urban speed
    pub fn straight(waypoints: &[LatLng]) -> Self {
        let distance_meters = path_length(waypoints);
        Self {
            distance_meters,
            duration_seconds: distance_meters / FALLBACK_SPEED_MPS,
            coordinates: waypoints.to_vec(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }
}

#[async_trait]
pub trait Router: Send + Sync {
    /// Driving route through at least two waypoints
    async fn route(&self, waypoints: &[LatLng]) -> Result<Route>;
}

#[async_trait]
impl<R: Router + ?Sized> Router for Arc<R> {
    async fn route(&self, waypoints: &[LatLng]) -> Result<Route> {
        (**self).route(waypoints).await
    }
}

/// `lng,lat;lng,lat;...` as expected by OSRM path segments
pub fn encode_waypoints(waypoints: &[LatLng]) -> String {
    waypoints
        .iter()
        .map(|p| format!("{:.6},{:.6}", p.lng, p.lat))
        .collect::<Vec<_>>()
        .join(";")
}

/// OSRM-compatible HTTP router
#[derive(Debug, Clone)]
pub struct OsrmRouter {
    base_url: String,
    profile: String,
}

impl OsrmRouter {
    pub fn new(base_url: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            profile: profile.into(),
        }
    }

    pub fn public_demo() -> Self {
        Self::new("https://router.project-osrm.org", "driving")
    }

    fn url(&self, waypoints: &[LatLng]) -> String {
        format!(
            "{}/route/v1/{}/{}",
            self.base_url,
            self.profile,
            encode_waypoints(waypoints)
        )
    }
}

#[async_trait]
impl Router for OsrmRouter {
    async fn route(&self, waypoints: &[LatLng]) -> Result<Route> {
        if waypoints.len() < 2 {
            return Err(MapError::InvalidInput(format!(
                "route needs at least 2 waypoints, got {}",
                waypoints.len()
            )));
        }
        let response = HTTP_CLIENT
            .get(self.url(waypoints))
            .query(&[("overview", "full"), ("geometries", "geojson")])
            .send()
            .await?
            .error_for_status()?
            .json::<OsrmResponse>()
            .await?;
        response.into_route()
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: OsrmGeometry,
}

/// GeoJSON LineString, positions as `[lng, lat]`
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl OsrmResponse {
    fn into_route(self) -> Result<Route> {
        if self.code != "Ok" {
            let detail = self.message.unwrap_or_default();
            return Err(MapError::ProviderUnavailable(format!("{}: {}", self.code, detail)));
        }
        let route = self
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| MapError::ProviderUnavailable("no route returned".to_string()))?;

        Ok(Route {
            distance_meters: route.distance,
            duration_seconds: route.duration,
            coordinates: route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lng, lat]| LatLng::new(lat, lng))
                .collect(),
        })
    }
}

/// Waypoints → route, keyed by the rounded waypoint list
pub struct RouteProducer<R> {
    router: R,
    precision: u32,
}

impl<R: Router> RouteProducer<R> {
    pub fn new(router: R, precision: u32) -> Self {
        Self { router, precision }
    }
}

#[async_trait]
impl<R: Router> Producer for RouteProducer<R> {
    type Query = [LatLng];
    type Key = Vec<(i64, i64)>;
    type Value = Route;

    fn cache_key(&self, query: &[LatLng]) -> Vec<(i64, i64)> {
        query.iter().map(|p| p.quantize(self.precision)).collect()
    }

    fn validate(&self, query: &[LatLng]) -> Result<()> {
        if query.len() < 2 {
            return Err(MapError::InvalidInput(format!(
                "route needs at least 2 waypoints, got {}",
                query.len()
            )));
        }
        match query.iter().find(|p| !p.is_valid()) {
            Some(bad) => Err(MapError::InvalidInput(format!("{:?}", bad))),
            None => Ok(()),
        }
    }

    async fn fetch(&self, query: &[LatLng]) -> Result<Route> {
        self.router.route(query).await
    }

    fn fallback(&self, query: &[LatLng]) -> Route {
        let valid: Vec<LatLng> = query.iter().copied().filter(LatLng::is_valid).collect();
        Route::straight(&valid)
    }
}
