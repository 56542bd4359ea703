pub mod amenity;
pub mod nominatim;
pub mod overpass;

#[cfg(test)]
pub(crate) mod test_server;

pub use amenity::{AmenityFinder, FindError};
pub use nominatim::{GeocodeError, NominatimClient, ReverseGeocoder};
pub use overpass::{Element, ElementKind, OverpassClient, OverpassError, OverpassResponse};
