//! Place search and reverse geocoding.
//!
//! This module provides:
//! - [`Geocoder`]: the async seam for turning a place name into a coordinate
//! - [`DetailedAddress`]: Nominatim address details plus a short "place, city" label
//! - [`field_from_search`]: draft a square parcel around a searched place
//! - `NominatimClient` (feature `http`): OpenStreetMap Nominatim over reqwest,
//!   rate limited to one request per second
//!
//! Lookups never fail loudly: transport errors, bad status codes and
//! unparseable bodies all come back as `None`.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::field::{Field, FieldStatus};
use crate::geo_utils::square_from_center_and_area;
use crate::GeoPoint;

// ============================================================================
// Types
// ============================================================================

/// A geocoded place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoResult {
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detailed_address: Option<DetailedAddress>,
}

impl GeoResult {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Address details for a place, with a compact label for field cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedAddress {
    pub display_name: String,
    /// "place, city" style label
    pub human_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub road: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suburb: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub village: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postcode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// The `address` object of a Nominatim response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NominatimAddress {
    pub village: Option<String>,
    pub suburb: Option<String>,
    pub hamlet: Option<String>,
    pub neighbourhood: Option<String>,
    pub road: Option<String>,
    pub place: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub municipality: Option<String>,
    pub district: Option<String>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub postcode: Option<String>,
    pub country: Option<String>,
}

/// One entry of a Nominatim search or reverse response.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    /// Nominatim sends coordinates as strings
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub address: NominatimAddress,
}

/// First non-empty value.
fn first_of<'a>(candidates: &[&'a Option<String>]) -> Option<&'a str> {
    candidates
        .iter()
        .filter_map(|c| c.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Short label: most specific place name, then the city, joined as "place, city".
///
/// Falls back to the first comma-separated segment of the display name.
pub fn human_address(display_name: &str, address: &NominatimAddress) -> String {
    let place = first_of(&[
        &address.village,
        &address.suburb,
        &address.hamlet,
        &address.neighbourhood,
        &address.road,
        &address.place,
    ]);
    let city = first_of(&[&address.city, &address.town, &address.district, &address.county]);

    match (place, city) {
        (Some(place), Some(city)) => format!("{}, {}", place, city),
        (Some(place), None) => place.to_string(),
        (None, Some(city)) => city.to_string(),
        (None, None) => display_name.split(',').next().unwrap_or_default().trim().to_string(),
    }
}

impl DetailedAddress {
    pub fn from_nominatim(display_name: &str, address: &NominatimAddress) -> Self {
        let owned = |v: Option<&str>| v.map(str::to_string);
        Self {
            display_name: display_name.to_string(),
            human_address: human_address(display_name, address),
            road: owned(first_of(&[&address.road])),
            suburb: owned(first_of(&[&address.suburb])),
            city: owned(first_of(&[&address.city, &address.town, &address.municipality])),
            village: owned(first_of(&[&address.village, &address.hamlet])),
            state: owned(first_of(&[&address.state])),
            postcode: owned(first_of(&[&address.postcode])),
            country: owned(first_of(&[&address.country])),
        }
    }
}

impl NominatimPlace {
    /// Convert a search hit; `None` when coordinates are missing or not numbers.
    pub fn into_geo_result(self, query: &str) -> Option<GeoResult> {
        let lat: f64 = self.lat.as_deref()?.trim().parse().ok()?;
        let lng: f64 = self.lon.as_deref()?.trim().parse().ok()?;
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }

        let display_name = self
            .display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| query.trim().to_string());
        let detailed = DetailedAddress::from_nominatim(&display_name, &self.address);

        Some(GeoResult {
            lat,
            lng,
            display_name,
            detailed_address: Some(detailed),
        })
    }

    /// Convert a reverse lookup; `None` for Nominatim's `{"error": ..}` bodies.
    pub fn into_detailed_address(self) -> Option<DetailedAddress> {
        let display_name = self.display_name?;
        Some(DetailedAddress::from_nominatim(&display_name, &self.address))
    }
}

// ============================================================================
// Geocoder
// ============================================================================

/// Asynchronous place lookup.
///
/// Implementations return `None` for blank queries and for any failure.
pub trait Geocoder {
    fn geocode(&self, query: &str) -> impl Future<Output = Option<GeoResult>> + Send;

    fn reverse_geocode(&self, point: &GeoPoint) -> impl Future<Output = Option<DetailedAddress>> + Send;
}

/// Geocode `query` and draft a square field of `acres` centered on the result.
///
/// The draft has no id (the store assigns one) and status `Available`. An
/// empty `name` falls back to the place label. Non-positive `acres` become 1.
pub async fn field_from_search<G: Geocoder>(
    geocoder: &G,
    query: &str,
    acres: f64,
    name: &str,
) -> Option<Field> {
    if query.trim().is_empty() {
        return None;
    }
    let result = geocoder.geocode(query.trim()).await?;

    let label = result
        .detailed_address
        .as_ref()
        .map(|d| d.human_address.clone())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| result.display_name.clone());
    let name = if name.trim().is_empty() { label.clone() } else { name.trim().to_string() };

    let ring = square_from_center_and_area(&result.point(), acres).to_vec();
    let field = Field::new("", name, ring, FieldStatus::Available).ok()?;
    Some(field.with_address(Some(result.display_name), Some(label)))
}

// ============================================================================
// Nominatim HTTP client
// ============================================================================

#[cfg(feature = "http")]
pub use client::NominatimClient;

#[cfg(feature = "http")]
mod client {
    use std::time::{Duration, Instant};

    use log::{debug, warn};
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
    use reqwest::Client;
    use tokio::sync::Mutex;

    use super::{DetailedAddress, GeoResult, Geocoder, NominatimPlace};
    use crate::error::{LandfenceError, Result};
    use crate::GeoPoint;

    const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";
    const USER_AGENT: &str = concat!("landfence/", env!("CARGO_PKG_VERSION"), " (field mapping)");
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    // Nominatim usage policy: at most one request per second
    const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

    /// Spaces requests at least `MIN_REQUEST_INTERVAL` apart.
    struct RateLimiter {
        last_request: Mutex<Option<Instant>>,
    }

    impl RateLimiter {
        fn new() -> Self {
            Self {
                last_request: Mutex::new(None),
            }
        }

        async fn wait_if_needed(&self) {
            let mut last = self.last_request.lock().await;
            if let Some(previous) = *last {
                let elapsed = previous.elapsed();
                if elapsed < MIN_REQUEST_INTERVAL {
                    let wait = MIN_REQUEST_INTERVAL - elapsed;
                    debug!("[Geocode] Rate limit: waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
            *last = Some(Instant::now());
        }
    }

    /// OpenStreetMap Nominatim geocoder.
    pub struct NominatimClient {
        client: Client,
        base_url: String,
        rate_limiter: RateLimiter,
    }

    impl NominatimClient {
        /// Client for the public Nominatim instance.
        pub fn new() -> Result<Self> {
            Self::with_base_url(DEFAULT_BASE_URL)
        }

        /// Client for a self-hosted Nominatim instance.
        pub fn with_base_url(base_url: &str) -> Result<Self> {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en"));

            let client = Client::builder()
                .user_agent(USER_AGENT)
                .default_headers(headers)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .map_err(|e| LandfenceError::Internal {
                    message: format!("Failed to create HTTP client: {}", e),
                })?;

            Ok(Self {
                client,
                base_url: base_url.trim_end_matches('/').to_string(),
                rate_limiter: RateLimiter::new(),
            })
        }

        async fn get_json<T: serde::de::DeserializeOwned>(
            &self,
            endpoint: &str,
            params: &[(&str, String)],
        ) -> Option<T> {
            self.rate_limiter.wait_if_needed().await;

            let url = format!("{}/{}", self.base_url, endpoint);
            debug!("[Geocode] GET {} {:?}", url, params);

            let response = match self.client.get(&url).query(params).send().await {
                Ok(r) => r,
                Err(e) => {
                    warn!("[Geocode] Request to {} failed: {}", endpoint, e);
                    return None;
                }
            };

            let status = response.status();
            if !status.is_success() {
                warn!("[Geocode] {} returned HTTP {}", endpoint, status);
                return None;
            }

            match response.json::<T>().await {
                Ok(body) => Some(body),
                Err(e) => {
                    warn!("[Geocode] Unparseable {} response: {}", endpoint, e);
                    None
                }
            }
        }
    }

    impl Geocoder for NominatimClient {
        async fn geocode(&self, query: &str) -> Option<GeoResult> {
            let query = query.trim();
            if query.is_empty() {
                return None;
            }

            let params = [
                ("q", query.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("limit", "1".to_string()),
            ];
            let places: Vec<NominatimPlace> = self.get_json("search", &params).await?;
            let result = places.into_iter().next()?.into_geo_result(query);
            if result.is_none() {
                debug!("[Geocode] No usable result for '{}'", query);
            }
            result
        }

        async fn reverse_geocode(&self, point: &GeoPoint) -> Option<DetailedAddress> {
            let params = [
                ("lat", point.latitude.to_string()),
                ("lon", point.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
            ];
            let place: NominatimPlace = self.get_json("reverse", &params).await?;
            place.into_detailed_address()
        }
    }

}
