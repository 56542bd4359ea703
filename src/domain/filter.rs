use super::Place;

/// Attribute toggles applied to query results.
///
/// Each enabled toggle keeps only places whose attribute is known to be
/// affirmative; toggles combine with AND.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaceFilter {
    pub free: bool,
    pub wheelchair: bool,
    pub diaper: bool,
}

impl PlaceFilter {
    pub fn is_empty(&self) -> bool {
        !(self.free || self.wheelchair || self.diaper)
    }

    pub fn matches(&self, place: &Place) -> bool {
        let required = |enabled: bool, value: Option<bool>| !enabled || value == Some(true);

        required(self.free, place.free)
            && required(self.wheelchair, place.wheelchair)
            && required(self.diaper, place.diaper)
    }

    pub fn apply(&self, places: Vec<Place>) -> Vec<Place> {
        if self.is_empty() {
            return places;
        }
        places.into_iter().filter(|p| self.matches(p)).collect()
    }
}
