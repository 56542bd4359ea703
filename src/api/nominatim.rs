use anyhow::{Context, Result};
use reqwest::header::ACCEPT_LANGUAGE;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::config::NominatimConfig;
use crate::domain::Location;

pub const NO_ADDRESS: &str = "could not determine address";

/// Structured address breakdown (`addressdetails=1`)
#[derive(Debug, Default, Deserialize)]
pub struct NominatimAddress {
    #[serde(default)]
    pub house_number: Option<String>,
    #[serde(default)]
    pub road: Option<String>,
    #[serde(default)]
    pub suburb: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
}

/// Body of a `/reverse` lookup. Nominatim answers failures with `{"error": ...}`
#[derive(Debug, Default, Deserialize)]
pub struct ReverseResponse {
    #[serde(default)]
    pub address: Option<NominatimAddress>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("failed to send request to Nominatim API")]
    Transport(#[source] reqwest::Error),
    #[error("Nominatim API returned error status: {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse Nominatim JSON response")]
    Decode(#[source] reqwest::Error),
    #[error("Nominatim API error: {0}")]
    Upstream(String),
}

/// Upstream coordinate to address lookup
pub trait ReverseGeocoder: Send + Sync {
    fn reverse(&self, location: Location) -> Result<String, GeocodeError>;
}

impl<T: ReverseGeocoder + ?Sized> ReverseGeocoder for Arc<T> {
    fn reverse(&self, location: Location) -> Result<String, GeocodeError> {
        (**self).reverse(location)
    }
}

/// Join address parts into a single lower-case label.
///
/// Order is house number, road, suburb, then city and postcode. Singapore
/// addresses read "singapore <postcode>" as one part. Repeated parts are
/// dropped. Returns `None` when nothing usable is present.
pub fn compose_address(address: &NominatimAddress) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut push = |part: &str| {
        let part = part.trim().to_lowercase();
        if !part.is_empty() && !parts.contains(&part) {
            parts.push(part);
        }
    };

    for part in [&address.house_number, &address.road, &address.suburb]
        .into_iter()
        .flatten()
    {
        push(part.as_str());
    }

    match (&address.city, &address.postcode) {
        (Some(city), postcode) if city.eq_ignore_ascii_case("singapore") => match postcode {
            Some(code) => push(&format!("singapore {}", code)),
            None => push("singapore"),
        },
        (city, postcode) => {
            for part in [city, postcode].into_iter().flatten() {
                push(part.as_str());
            }
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(", "))
    }
}

/// Turn a decoded response into an address label
pub fn describe(response: ReverseResponse) -> Result<String, GeocodeError> {
    if let Some(address) = response.address.as_ref().and_then(compose_address) {
        return Ok(address);
    }
    if let Some(name) = response.display_name {
        return Ok(name.to_lowercase());
    }
    if let Some(error) = response.error {
        return Err(GeocodeError::Upstream(error));
    }
    Ok(NO_ADDRESS.to_string())
}

/// Blocking Nominatim reverse-geocoding client
pub struct NominatimClient {
    http: reqwest::blocking::Client,
    reverse_url: String,
    accept_language: String,
}

impl NominatimClient {
    pub fn new(config: &NominatimConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            reverse_url: format!("{}/reverse", config.url.trim_end_matches('/')),
            accept_language: config.accept_language.clone(),
        })
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, location: Location) -> Result<String, GeocodeError> {
        let response = self
            .http
            .get(&self.reverse_url)
            .header(ACCEPT_LANGUAGE, self.accept_language.as_str())
            .query(&[
                ("format", "json".to_string()),
                ("lat", location.lat.to_string()),
                ("lon", location.lng.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .map_err(GeocodeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        let body: ReverseResponse = response.json().map_err(GeocodeError::Decode)?;
        describe(body)
    }
}
