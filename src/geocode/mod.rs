pub mod cache;
pub mod clock;
pub mod key;

pub use cache::{GeocodeCache, UNKNOWN_LOCATION};
pub use clock::{Clock, ManualClock, SystemClock};
pub use key::{cache_key, round_coord};
