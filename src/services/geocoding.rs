// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Place search, reverse geocoding and driving routes.
//!
//! Talks to a Nominatim-compatible geocoder and an OSRM-compatible router.
//! Reverse lookups are cached in memory by rounded coordinate, since the
//! map pin tends to settle on the same spot repeatedly.

use crate::config::Config;
use crate::error::AppError;
use crate::models::{LatLng, Place, Route};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::Arc;

/// Coordinates are rounded to this many decimal places (~11 m) for caching.
const CACHE_PRECISION: f64 = 10_000.0;

/// OSRM polylines use precision 5.
const POLYLINE_PRECISION: u32 = 5;

const SEARCH_LIMIT: u32 = 5;

/// Default number of reverse lookups kept in memory.
pub const DEFAULT_REVERSE_CACHE_CAPACITY: usize = 256;

/// Shared reverse-geocode cache.
pub type ReverseCache = Arc<DashMap<(i64, i64), Place>>;

/// Geocoding/routing client.
#[derive(Clone)]
pub struct GeocodingService {
    http: reqwest::Client,
    geocoder_url: String,
    router_url: String,
    cache: ReverseCache,
    cache_capacity: usize,
}

impl GeocodingService {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("ride-booking-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            geocoder_url: config.geocoder_base_url.trim_end_matches('/').to_string(),
            router_url: config.router_base_url.trim_end_matches('/').to_string(),
            cache: Arc::new(DashMap::new()),
            cache_capacity: DEFAULT_REVERSE_CACHE_CAPACITY,
        })
    }

    /// Limit the reverse cache to `capacity` entries (at least one).
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity.max(1);
        self
    }

    /// Number of cached reverse lookups.
    pub fn cached_places(&self) -> usize {
        self.cache.len()
    }

    /// Forget all cached reverse lookups.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Search places by free text, optionally biased towards `near`.
    pub async fn search(&self, query: &str, near: Option<LatLng>) -> Result<Vec<Place>, AppError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("format", "jsonv2".to_string()),
            ("limit", SEARCH_LIMIT.to_string()),
        ];
        if let Some(near) = near {
            // Bias (not restrict) results to a ~0.5 degree box around `near`.
            params.push((
                "viewbox",
                format!(
                    "{},{},{},{}",
                    near.lng - 0.25,
                    near.lat + 0.25,
                    near.lng + 0.25,
                    near.lat - 0.25
                ),
            ));
        }

        let hits: Vec<NominatimPlace> = self
            .get_json(&format!("{}/search", self.geocoder_url), &params)
            .await?;

        hits.into_iter().map(NominatimPlace::into_place).collect()
    }

    /// Address for a coordinate.
    pub async fn reverse(&self, position: LatLng) -> Result<Place, AppError> {
        let key = cache_key(position);
        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        let params = [
            ("lat", position.lat.to_string()),
            ("lon", position.lng.to_string()),
            ("format", "jsonv2".to_string()),
        ];
        let hit: NominatimPlace = self
            .get_json(&format!("{}/reverse", self.geocoder_url), &params)
            .await?;
        let place = hit.into_place()?;

        self.remember(key, place.clone());
        Ok(place)
    }

    /// Fastest driving route from `from` to `to`.
    pub async fn route(&self, from: LatLng, to: LatLng) -> Result<Route, AppError> {
        let url = format!(
            "{}/route/v1/driving/{},{};{},{}",
            self.router_url, from.lng, from.lat, to.lng, to.lat
        );
        let params = [
            ("overview", "full".to_string()),
            ("geometries", "polyline".to_string()),
        ];
        let response: OsrmResponse = self.get_json(&url, &params).await?;

        if response.code != "Ok" {
            return Err(AppError::Geocoding(format!(
                "Router returned {}",
                response.code
            )));
        }
        let best = response
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Geocoding("No route found".to_string()))?;

        let geometry = polyline::decode_polyline(&best.geometry, POLYLINE_PRECISION)
            .map_err(|e| AppError::Geocoding(format!("Polyline error: {}", e)))?;

        Ok(Route {
            distance_meters: best.distance,
            duration_secs: best.duration,
            geometry,
        })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, AppError> {
        let response = self
            .http
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::Geocoding(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(status = %status, url, "Geocoding request failed");
            return Err(AppError::Geocoding(format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Geocoding(format!("JSON parse error: {}", e)))
    }

    fn remember(&self, key: (i64, i64), place: Place) {
        while self.cache.len() >= self.cache_capacity {
            // Evict an arbitrary entry.
            let victim = self.cache.iter().next().map(|entry| *entry.key());
            match victim {
                Some(victim) => {
                    self.cache.remove(&victim);
                }
                None => break,
            }
        }
        self.cache.insert(key, place);
    }
}

fn cache_key(position: LatLng) -> (i64, i64) {
    (
        (position.lat * CACHE_PRECISION).round() as i64,
        (position.lng * CACHE_PRECISION).round() as i64,
    )
}

/// Nominatim returns coordinates as strings.
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
}

impl NominatimPlace {
    fn into_place(self) -> Result<Place, AppError> {
        let parse = |raw: &str| {
            raw.parse::<f64>()
                .map_err(|_| AppError::Geocoding(format!("Invalid coordinate: {}", raw)))
        };
        Ok(Place {
            position: LatLng {
                lat: parse(&self.lat)?,
                lng: parse(&self.lon)?,
            },
            display_name: self.display_name,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    distance: f64,
    duration: f64,
    geometry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_rounds_nearby_points_together() {
        let a = LatLng {
            lat: 12.971_61,
            lng: 77.594_58,
        };
        let b = LatLng {
            lat: 12.971_64,
            lng: 77.594_62,
        };
        assert_eq!(cache_key(a), cache_key(b));

        let far = LatLng {
            lat: 12.972_6,
            lng: 77.594_6,
        };
        assert_ne!(cache_key(a), cache_key(far));
    }

    #[test]
    fn test_nominatim_place_parses_string_coordinates() {
        let raw: NominatimPlace = serde_json::from_str(
            r#"{"display_name": "Cubbon Park, Bengaluru", "lat": "12.9763", "lon": "77.5929"}"#,
        )
        .unwrap();
        let place = raw.into_place().unwrap();
        assert_eq!(place.position.lat, 12.9763);
        assert_eq!(place.to_location().address.as_deref(), Some("Cubbon Park, Bengaluru"));
    }

    #[test]
    fn test_nominatim_place_rejects_bad_coordinates() {
        let raw = NominatimPlace {
            display_name: "Nowhere".to_string(),
            lat: "north".to_string(),
            lon: "0".to_string(),
        };
        assert!(raw.into_place().is_err());
    }
}
