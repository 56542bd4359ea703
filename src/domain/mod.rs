pub mod filter;
pub mod location;
pub mod place;

pub use filter::PlaceFilter;
pub use location::{BoundingBox, Location};
pub use place::{Place, PlaceCategory};
