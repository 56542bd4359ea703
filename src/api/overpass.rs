use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use crate::config::{OverpassConfig, USER_AGENT};
use crate::domain::{BoundingBox, Location};

/// Raw Overpass API response
#[derive(Debug, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

/// OSM geometry kind of an element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

/// Centroid emitted by `out center` for ways and relations
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Center {
    pub lat: f64,
    pub lon: f64,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: ElementKind,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    #[serde(default)]
    pub center: Option<Center>,
}

impl Element {
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.as_ref()?.get(key).map(String::as_str)
    }

    /// Centroid if present, otherwise the node's own coordinates
    pub fn position(&self) -> Option<Location> {
        if let Some(center) = self.center {
            return Some(Location::new(center.lat, center.lon));
        }
        Some(Location::new(self.lat?, self.lon?))
    }
}

#[derive(Debug, Error)]
pub enum OverpassError {
    #[error("failed to send request to Overpass API")]
    Transport(#[source] reqwest::Error),
    #[error("Overpass API returned error status: {0}")]
    Status(reqwest::StatusCode),
    #[error("failed to parse Overpass JSON response")]
    Decode(#[source] reqwest::Error),
}

/// Toilets and stations with toilets, plus the ways containing any matched node
pub fn toilet_query(bbox: &BoundingBox) -> String {
    let b = bbox.to_overpass();
    format!(
        r#"[out:json][timeout:25];
(
  node["amenity"="toilets"]({b});
  way["amenity"="toilets"]({b});
  relation["amenity"="toilets"]({b});
  node["railway"="station"]["toilets"="yes"]({b});
  way["railway"="station"]["toilets"="yes"]({b});
  relation["railway"="station"]["toilets"="yes"]({b});
)->.features;
node.features->.feature_nodes;
(
  .feature_nodes <;
)->.parents;
(.features; .parents;);
out center;"#
    )
}

pub fn atm_query(bbox: &BoundingBox) -> String {
    let b = bbox.to_overpass();
    format!(
        r#"[out:json][timeout:25];
(
  node["amenity"="atm"]({b});
  way["amenity"="atm"]({b});
  relation["amenity"="atm"]({b});
);
out center;"#
    )
}

/// Blocking Overpass client. One request per query, no retries.
pub struct OverpassClient {
    http: reqwest::blocking::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http,
            url: config.url.clone(),
        })
    }

    pub fn execute(&self, query: &str) -> Result<OverpassResponse, OverpassError> {
        // Overpass expects form-encoded POST data: data=<query>
        let response = self
            .http
            .post(&self.url)
            .form(&[("data", query)])
            .send()
            .map_err(OverpassError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(OverpassError::Status(status));
        }

        response.json().map_err(OverpassError::Decode)
    }
}
