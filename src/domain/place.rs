use serde::{Deserialize, Serialize};
use std::fmt;

use super::Location;

/// Amenity kinds findit knows how to query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlaceCategory {
    Toilet,
    Atm,
}

impl PlaceCategory {
    /// Plural label used in user-facing messages
    pub fn plural(&self) -> &'static str {
        match self {
            PlaceCategory::Toilet => "toilets",
            PlaceCategory::Atm => "atms",
        }
    }
}

impl fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceCategory::Toilet => f.write_str("toilet"),
            PlaceCategory::Atm => f.write_str("atm"),
        }
    }
}

/// A normalized amenity. All text fields are lower case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub id: String,
    pub name: String,
    pub category: PlaceCategory,
    pub location: Location,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Name of the building or station this amenity sits in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub housed_in: Option<String>,
    /// `Some(true)` when the `fee` tag says usage costs nothing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wheelchair: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diaper: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
}

impl Place {
    pub fn new(id: String, name: String, category: PlaceCategory, location: Location) -> Self {
        Self {
            id,
            name,
            category,
            location,
            address: None,
            housed_in: None,
            free: None,
            wheelchair: None,
            diaper: None,
            operator: None,
            network: None,
            brand: None,
        }
    }
}
