//! Reverse geocoding against a Nominatim-compatible endpoint.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::common::Coordinates;
use crate::kernel::BaseGeocoder;

pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Nominatim `/reverse` client.
///
/// The public service requires an identifying User-Agent.
#[derive(Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Option<ReverseAddress>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReverseAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
}

impl ReverseAddress {
    fn settlement(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .filter(|name| !name.trim().is_empty())
    }
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl BaseGeocoder for NominatimGeocoder {
    async fn reverse_city(&self, coordinates: Coordinates) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let lat = coordinates.lat().to_string();
        let lon = coordinates.lng().to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("format", "jsonv2"),
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("zoom", "10"),
                ("addressdetails", "1"),
                ("accept-language", "en"),
            ])
            .send()
            .await
            .context("Reverse geocoding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Geocoder returned an error status");
            anyhow::bail!("geocoder returned {}", status);
        }

        let parsed: ReverseResponse = response
            .json()
            .await
            .context("Failed to parse geocoder response")?;

        if let Some(error) = parsed.error {
            debug!(%coordinates, error = %error, "Geocoder found nothing at coordinates");
            return Ok(None);
        }

        Ok(parsed.address.and_then(ReverseAddress::settlement))
    }
}
