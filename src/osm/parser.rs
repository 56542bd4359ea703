use crate::api::{Element, ElementKind, OverpassResponse};
use crate::domain::{Place, PlaceCategory};
use std::collections::HashMap;
use tracing::debug;

pub const NO_TAG_ADDRESS: &str = "address not available";

const ADDRESS_TAGS: [&str; 4] = ["addr:street", "addr:housenumber", "addr:postcode", "addr:city"];

/// Parse an Overpass toilet response into places
///
/// # Algorithm
/// 1. Build node_id → way name lookup from every named way (first way wins)
/// 2. For each element tagged as a toilet or a station with toilets:
///    - Resolve position (center first), drop the element if there is none
///    - Derive name, address and fee/wheelchair/diaper flags
///    - Attach the containing way's name for nodes found in the lookup
pub fn parse_toilets(response: &OverpassResponse) -> Vec<Place> {
    let parents = build_parent_names(response);

    response
        .elements
        .iter()
        .filter(|e| is_toilet(e))
        .filter_map(|element| {
            let mut place = base_place(element, element.id.to_string(), PlaceCategory::Toilet)?;
            place.name = toilet_name(element);
            place.free = Some(is_free(element.tag("fee")));
            place.wheelchair = Some(element.tag("wheelchair") == Some("yes"));
            place.diaper = Some(element.tag("diaper") == Some("yes"));
            if element.type_ == ElementKind::Node {
                place.housed_in = parents.get(&element.id).map(|name| name.to_lowercase());
            }
            Some(place)
        })
        .collect()
}

/// Parse an Overpass ATM response into places
pub fn parse_atms(response: &OverpassResponse) -> Vec<Place> {
    response
        .elements
        .iter()
        .filter_map(|element| {
            let mut place = base_place(element, format!("atm-{}", element.id), PlaceCategory::Atm)?;
            place.name = atm_name(element);
            place.operator = lower_tag(element, "operator");
            place.network = lower_tag(element, "network");
            place.brand = lower_tag(element, "brand");
            Some(place)
        })
        .collect()
}

/// Shared fields; `None` when the element carries no usable position
fn base_place(element: &Element, id: String, category: PlaceCategory) -> Option<Place> {
    let Some(location) = element.position() else {
        debug!(id = element.id, kind = ?element.type_, "dropping element without coordinates");
        return None;
    };

    let mut place = Place::new(id, String::new(), category, location);
    place.address = Some(tag_address(element));
    Some(place)
}

fn is_toilet(element: &Element) -> bool {
    element.tag("amenity") == Some("toilets") || is_station_with_toilets(element)
}

fn is_station_with_toilets(element: &Element) -> bool {
    element.tag("railway") == Some("station") && element.tag("toilets") == Some("yes")
}

fn toilet_name(element: &Element) -> String {
    let tagged = element.tag("name").filter(|v| !v.is_empty());
    let name = if is_station_with_toilets(element) {
        match tagged {
            Some(station) => format!("{} station toilet", station),
            None => "station toilet".to_string(),
        }
    } else {
        tagged.unwrap_or("public toilet").to_string()
    };
    name.to_lowercase()
}

fn atm_name(element: &Element) -> String {
    ["name", "operator", "brand", "network"]
        .into_iter()
        .find_map(|key| element.tag(key).filter(|v| !v.is_empty()))
        .unwrap_or("atm")
        .to_lowercase()
}

/// Street, house number, postcode, city, whichever are tagged
pub fn tag_address(element: &Element) -> String {
    let parts: Vec<&str> = ADDRESS_TAGS
        .iter()
        .filter_map(|key| element.tag(key))
        .filter(|v| !v.is_empty())
        .collect();

    if parts.is_empty() {
        NO_TAG_ADDRESS.to_string()
    } else {
        parts.join(", ").to_lowercase()
    }
}

/// `fee=no` or `fee=0` means using the amenity costs nothing
fn is_free(fee: Option<&str>) -> bool {
    matches!(fee, Some("no") | Some("0"))
}

fn lower_tag(element: &Element, key: &str) -> Option<String> {
    element.tag(key).map(str::to_lowercase)
}

/// Map each node id to the name of the first named way that lists it
fn build_parent_names(response: &OverpassResponse) -> HashMap<u64, &str> {
    let mut parents = HashMap::new();

    for element in &response.elements {
        if element.type_ == ElementKind::Node {
            continue;
        }
        let (Some(name), Some(nodes)) = (element.tag("name"), &element.nodes) else {
            continue;
        };
        for node_id in nodes {
            parents.entry(*node_id).or_insert(name);
        }
    }

    parents
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(json: &str) -> OverpassResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_parse_toilets_basic() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.30, "lon": 103.80,
                 "tags": {"amenity": "toilets", "fee": "no", "wheelchair": "yes",
                          "addr:street": "Orchard Rd", "addr:housenumber": "5",
                          "addr:postcode": "238823", "addr:city": "Singapore"}}
            ]}"#,
        ));

        assert_eq!(places.len(), 1);
        let toilet = &places[0];
        assert_eq!(toilet.id, "1");
        assert_eq!(toilet.name, "public toilet");
        assert_eq!(toilet.category, PlaceCategory::Toilet);
        assert_eq!(toilet.address.as_deref(), Some("orchard rd, 5, 238823, singapore"));
        assert_eq!(toilet.free, Some(true));
        assert_eq!(toilet.wheelchair, Some(true));
        assert_eq!(toilet.diaper, Some(false));
        assert_eq!(toilet.housed_in, None);
    }

    #[test]
    fn test_center_used_and_missing_coordinates_dropped() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "way", "id": 10, "center": {"lat": 1.5, "lon": 103.5},
                 "tags": {"amenity": "toilets"}},
                {"type": "relation", "id": 11, "tags": {"amenity": "toilets"}},
                {"type": "node", "id": 12, "lat": 1.6, "tags": {"amenity": "toilets"}}
            ]}"#,
        ));

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].id, "10");
        assert_eq!(places[0].location.lat, 1.5);
        assert_eq!(places[0].location.lng, 103.5);
    }

    #[test]
    fn test_station_toilet_names() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0,
                 "tags": {"railway": "station", "toilets": "yes"}},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 1.0,
                 "tags": {"railway": "station", "toilets": "yes", "name": "Jurong East"}},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "toilets", "name": "Changi Beach Park Toilet"}},
                {"type": "node", "id": 4, "lat": 1.0, "lon": 1.0,
                 "tags": {"railway": "station", "name": "No Toilets Here"}}
            ]}"#,
        ));

        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["station toilet", "jurong east station toilet", "changi beach park toilet"]
        );
    }

    #[test]
    fn test_empty_name_tag_counts_as_unnamed() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "toilets", "name": ""}},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 1.0,
                 "tags": {"railway": "station", "toilets": "yes", "name": ""}}
            ]}"#,
        ));

        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["public toilet", "station toilet"]);
    }

    #[test]
    fn test_fee_derivation() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets", "fee": "no"}},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets", "fee": "yes"}},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets"}},
                {"type": "node", "id": 4, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets", "fee": "0"}},
                {"type": "node", "id": 5, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets", "fee": "0.20 SGD"}}
            ]}"#,
        ));

        let free: Vec<Option<bool>> = places.iter().map(|p| p.free).collect();
        assert_eq!(free, vec![Some(true), Some(false), Some(false), Some(true), Some(false)]);
    }

    #[test]
    fn test_wheelchair_and_diaper_need_exact_yes() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "toilets", "wheelchair": "limited", "diaper": "Yes"}}
            ]}"#,
        ));

        assert_eq!(places[0].wheelchair, Some(false));
        assert_eq!(places[0].diaper, Some(false));
    }

    #[test]
    fn test_housed_in_first_named_way_wins() {
        // Node 1 sits in two named ways; the earlier one in source order is kept
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "way", "id": 100, "nodes": [1, 2], "tags": {"name": "ION Orchard"}},
                {"type": "way", "id": 101, "nodes": [1, 3], "tags": {"name": "Orchard MRT"}},
                {"type": "way", "id": 102, "nodes": [2], "tags": {"building": "yes"}},
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets"}},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets"}},
                {"type": "node", "id": 4, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets"}}
            ]}"#,
        ));

        // Parent ways themselves are not toilets
        assert_eq!(places.len(), 3);
        assert_eq!(places[0].housed_in.as_deref(), Some("ion orchard"));
        assert_eq!(places[1].housed_in.as_deref(), Some("orchard mrt"));
        assert_eq!(places[2].housed_in, None);
    }

    #[test]
    fn test_housed_in_only_for_nodes() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "way", "id": 100, "nodes": [7], "tags": {"name": "Mall"}},
                {"type": "way", "id": 7, "center": {"lat": 1.0, "lon": 1.0}, "tags": {"amenity": "toilets"}}
            ]}"#,
        ));

        assert_eq!(places.len(), 1);
        assert_eq!(places[0].housed_in, None);
    }

    #[test]
    fn test_partial_and_missing_address() {
        let places = parse_toilets(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "toilets", "addr:street": "Orchard Rd", "addr:housenumber": "5"}},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "toilets"}}
            ]}"#,
        ));

        assert_eq!(places[0].address.as_deref(), Some("orchard rd, 5"));
        assert_eq!(places[1].address.as_deref(), Some(NO_TAG_ADDRESS));
    }

    #[test]
    fn test_atm_name_fallback_chain() {
        let places = parse_atms(&response(
            r#"{"elements": [
                {"type": "node", "id": 1, "lat": 1.0, "lon": 1.0, "tags": {"amenity": "atm"}},
                {"type": "node", "id": 2, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "atm", "network": "NETS", "brand": "POSB"}},
                {"type": "node", "id": 3, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "atm", "operator": "DBS Bank", "brand": "POSB"}},
                {"type": "node", "id": 4, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "atm", "name": "OCBC ATM", "operator": "OCBC"}},
                {"type": "node", "id": 5, "lat": 1.0, "lon": 1.0,
                 "tags": {"amenity": "atm", "network": "Plus"}}
            ]}"#,
        ));

        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["atm", "posb", "dbs bank", "ocbc atm", "plus"]);
    }

    #[test]
    fn test_atm_fields() {
        let places = parse_atms(&response(
            r#"{"elements": [
                {"type": "way", "id": 9, "center": {"lat": 1.2, "lon": 103.9},
                 "tags": {"amenity": "atm", "operator": "DBS Bank", "network": "NETS", "brand": "POSB",
                          "addr:city": "Singapore"}},
                {"type": "node", "id": 10, "tags": {"amenity": "atm"}}
            ]}"#,
        ));

        assert_eq!(places.len(), 1);
        let atm = &places[0];
        assert_eq!(atm.id, "atm-9");
        assert_eq!(atm.category, PlaceCategory::Atm);
        assert_eq!(atm.operator.as_deref(), Some("dbs bank"));
        assert_eq!(atm.network.as_deref(), Some("nets"));
        assert_eq!(atm.brand.as_deref(), Some("posb"));
        assert_eq!(atm.address.as_deref(), Some("singapore"));
        assert_eq!(atm.free, None);
        assert_eq!(atm.housed_in, None);
    }
}
