use crate::utils::error::LookupError;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::value::RawValue;

/// One element of the suggestion array returned by the location service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "geo_position", default)]
    pub position: Option<GeoPosition>,
}

/// Coordinates kept as the exact text the service sent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeoPosition {
    #[serde(deserialize_with = "coordinate_text")]
    pub latitude: String,
    #[serde(deserialize_with = "coordinate_text")]
    pub longitude: String,
}

/// Accepts `"52.52437"` as well as a bare `52.52437` and keeps the digits as written.
fn coordinate_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Box::<RawValue>::deserialize(deserializer)?;
    let text = raw.get();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).map_err(D::Error::custom)
    } else if serde_json::from_str::<serde_json::Number>(text).is_ok() {
        Ok(text.to_string())
    } else {
        Err(D::Error::custom(format!(
            "expected coordinate string or number, found {}",
            text
        )))
    }
}

/// A location reduced to the five CSV columns, in output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatRecord {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub latitude: String,
    pub longitude: String,
}

impl TryFrom<&LocationRecord> for FlatRecord {
    type Error = LookupError;

    fn try_from(record: &LocationRecord) -> Result<Self, Self::Error> {
        let position = record
            .position
            .as_ref()
            .ok_or(LookupError::MissingField {
                field: "geo_position",
            })?;

        Ok(FlatRecord {
            id: record.id,
            name: record.name.clone(),
            kind: record.kind.clone(),
            latitude: position.latitude.clone(),
            longitude: position.longitude.clone(),
        })
    }
}
