use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info};

use super::overpass::{OverpassClient, OverpassError, atm_query, toilet_query};
use crate::config::OverpassConfig;
use crate::domain::{BoundingBox, Location, Place, PlaceCategory};
use crate::osm::{parse_atms, parse_toilets};

/// A nearby-amenity query failed as a whole; no places are returned
#[derive(Debug, Error)]
#[error("failed to find nearby {} from openstreetmap", .category.plural())]
pub struct FindError {
    pub category: PlaceCategory,
    #[source]
    pub source: OverpassError,
}

/// Finds amenities in a fixed-size box around a location
pub struct AmenityFinder {
    client: OverpassClient,
    bbox_delta: f64,
}

impl AmenityFinder {
    pub fn new(config: &OverpassConfig) -> Result<Self> {
        Ok(Self {
            client: OverpassClient::new(config)?,
            bbox_delta: config.bbox_delta,
        })
    }

    pub fn find_toilets(&self, location: Location) -> Result<Vec<Place>, FindError> {
        self.find(PlaceCategory::Toilet, location)
    }

    pub fn find_atms(&self, location: Location) -> Result<Vec<Place>, FindError> {
        self.find(PlaceCategory::Atm, location)
    }

    pub fn find(&self, category: PlaceCategory, location: Location) -> Result<Vec<Place>, FindError> {
        let bbox = BoundingBox::around(location, self.bbox_delta);
        let query = match category {
            PlaceCategory::Toilet => toilet_query(&bbox),
            PlaceCategory::Atm => atm_query(&bbox),
        };
        debug!(%category, ?bbox, "querying overpass");

        let response = self
            .client
            .execute(&query)
            .map_err(|source| FindError { category, source })?;

        let places = match category {
            PlaceCategory::Toilet => parse_toilets(&response),
            PlaceCategory::Atm => parse_atms(&response),
        };
        info!(
            %category,
            elements = response.elements.len(),
            places = places.len(),
            "overpass query complete"
        );

        Ok(places)
    }
}
