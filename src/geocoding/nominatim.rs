//! Nominatim geocoding client.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use super::Geocoder;
use crate::config::GeocoderConfig;
use crate::error::{Error, Result};
use crate::models::GeoPoint;

/// Geocoder backed by a Nominatim-compatible HTTP API
pub struct NominatimGeocoder {
    client: Client,
    base_url: Url,
}

/// One entry of a `/search` response. Coordinates come back as strings.
#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
    error: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocoderConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            Error::Config(format!("Invalid geocoder base_url '{}': {}", config.base_url, e))
        })?;

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid geocoder endpoint '{}': {}", path, e)))?;
        url.query_pairs_mut()
            .append_pair("format", "jsonv2")
            .extend_pairs(params);
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T> {
        debug!("Nominatim request: {}", url);

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Nominatim returned {}: {}", status, body);
            return Err(Error::Geocoding(format!("status {}", status)));
        }

        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    async fn forward(&self, address: &str) -> Result<Option<GeoPoint>> {
        let url = self.endpoint("search", &[("q", address), ("limit", "1")])?;
        let hits: Vec<SearchHit> = self.get_json(url).await?;
        parse_search_hits(&hits)
    }

    async fn reverse(&self, point: GeoPoint) -> Result<Option<String>> {
        let lat = point.lat.to_string();
        let lon = point.lon.to_string();
        let url = self.endpoint("reverse", &[("lat", lat.as_str()), ("lon", lon.as_str())])?;
        let body: ReverseResponse = self.get_json(url).await?;
        Ok(parse_reverse(body))
    }
}

fn parse_search_hits(hits: &[SearchHit]) -> Result<Option<GeoPoint>> {
    let Some(hit) = hits.first() else {
        return Ok(None);
    };

    let lat: f64 = hit
        .lat
        .parse()
        .map_err(|_| Error::Geocoding(format!("Unparseable latitude '{}'", hit.lat)))?;
    let lon: f64 = hit
        .lon
        .parse()
        .map_err(|_| Error::Geocoding(format!("Unparseable longitude '{}'", hit.lon)))?;

    GeoPoint::new(lat, lon)
        .map(Some)
        .map_err(|e| Error::Geocoding(e.to_string()))
}

fn parse_reverse(body: ReverseResponse) -> Option<String> {
    if let Some(err) = body.error {
        debug!("Nominatim reverse lookup found nothing: {}", err);
        return None;
    }
    body.display_name.filter(|name| !name.trim().is_empty())
}
