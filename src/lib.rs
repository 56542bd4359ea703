//! findit - Find nearby public toilets and ATMs from OpenStreetMap data

pub mod api;
pub mod config;
pub mod domain;
pub mod geocode;
pub mod osm;

pub use api::{AmenityFinder, FindError, NominatimClient};
pub use domain::{Location, Place, PlaceCategory, PlaceFilter};
pub use geocode::GeocodeCache;
