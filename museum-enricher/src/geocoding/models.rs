//! Nominatim response types and the place records derived from them.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::GeocodeError;

/// One hit of a `/search` request.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SearchResult {
    #[serde(default)]
    pub osm_type: String,
    #[serde(default)]
    pub osm_id: i64,
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub class: String,
    #[serde(rename = "type", default)]
    pub place_type: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub address: SearchAddress,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct SearchAddress {
    pub road: Option<String>,
    pub city: Option<String>,
    pub town: Option<String>,
    pub village: Option<String>,
    pub country: Option<String>,
    pub country_code: Option<String>,
}

/// Best match for a free-text query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub display_name: String,
    pub place_type: String,
    pub class: String,
    pub lat: f64,
    pub lon: f64,
    /// `node`, `way` or `relation`.
    pub osm_type: String,
    pub osm_id: i64,
    pub city: String,
    pub country: String,
    pub country_code: String,
    pub road: String,
}

impl TryFrom<SearchResult> for Place {
    type Error = GeocodeError;

    fn try_from(result: SearchResult) -> Result<Self, Self::Error> {
        let lat = result
            .lat
            .parse::<f64>()
            .map_err(|e| GeocodeError::parse(format!("invalid latitude {:?}: {}", result.lat, e)))?;
        let lon = result
            .lon
            .parse::<f64>()
            .map_err(|e| GeocodeError::parse(format!("invalid longitude {:?}: {}", result.lon, e)))?;

        let address = result.address;
        let city = address
            .city
            .or(address.town)
            .or(address.village)
            .unwrap_or_default();

        Ok(Self {
            name: result.name,
            display_name: result.display_name,
            place_type: result.place_type,
            class: result.class,
            lat,
            lon,
            osm_type: result.osm_type,
            osm_id: result.osm_id,
            city,
            country: address.country.unwrap_or_default(),
            country_code: address.country_code.unwrap_or_default(),
            road: address.road.unwrap_or_default(),
        })
    }
}

/// Single-letter OSM type expected by `/details`.
pub fn osm_type_code(osm_type: &str) -> Option<&'static str> {
    match osm_type.to_ascii_lowercase().as_str() {
        "node" | "n" => Some("N"),
        "way" | "w" => Some("W"),
        "relation" | "r" => Some("R"),
        _ => None,
    }
}

/// GeoJSON point or shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

/// Extended attributes of an OSM object, as returned by `/details`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub place_id: i64,
    #[serde(default)]
    pub parent_place_id: Option<i64>,
    #[serde(default)]
    pub osm_type: String,
    #[serde(default)]
    pub osm_id: i64,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "type", default)]
    pub place_type: String,
    #[serde(default)]
    pub admin_level: Option<i32>,
    #[serde(rename = "localname", default)]
    pub local_name: String,
    #[serde(default, deserialize_with = "tag_map")]
    pub names: BTreeMap<String, String>,
    #[serde(rename = "addresstags", default, deserialize_with = "tag_map")]
    pub address_tags: BTreeMap<String, String>,
    #[serde(rename = "housenumber", default)]
    pub house_number: Option<String>,
    #[serde(rename = "calculated_postcode", default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub importance: Option<f64>,
    #[serde(rename = "extratags", default, deserialize_with = "tag_map")]
    pub extra_tags: BTreeMap<String, String>,
    #[serde(rename = "calculated_wikipedia", default)]
    pub wikipedia: Option<String>,
    #[serde(default)]
    pub centroid: Option<Geometry>,
}

/// Nominatim sends `[]` instead of `{}` for an empty tag set.
fn tag_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        Map(BTreeMap<String, String>),
        List(Vec<serde_json::Value>),
        Null(()),
    }

    Ok(match Tags::deserialize(deserializer)? {
        Tags::Map(map) => map,
        Tags::List(_) | Tags::Null(()) => BTreeMap::new(),
    })
}
