//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum.
//! The functions here issue exactly one HTTP request each; pacing is the
//! job of [`crate::NominatimGeocoder`].
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use zone_radar_zones_models::{BoundingBox, Coordinate, GeoMatch};

use crate::GeocodeError;
use crate::transport::GeocodeTransport;

/// Geocodes a free-form query, returning the single best match.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request or response parsing fails.
pub async fn search<T: GeocodeTransport + ?Sized>(
    transport: &T,
    base_url: &str,
    query: &str,
) -> Result<Option<GeoMatch>, GeocodeError> {
    let params = [
        ("q", query.to_string()),
        ("format", "json".to_string()),
        ("limit", "1".to_string()),
        ("addressdetails", "1".to_string()),
    ];

    let body = transport.get_json(base_url, &params).await?;
    parse_search_response(&body)
}

/// Looks up the display name of the place at a coordinate.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails.
pub async fn reverse<T: GeocodeTransport + ?Sized>(
    transport: &T,
    reverse_url: &str,
    coordinate: Coordinate,
) -> Result<Option<String>, GeocodeError> {
    let params = [
        ("lat", coordinate.latitude.to_string()),
        ("lon", coordinate.longitude.to_string()),
        ("format", "json".to_string()),
        ("addressdetails", "1".to_string()),
    ];

    let body = transport.get_json(reverse_url, &params).await?;
    Ok(parse_reverse_response(&body))
}

/// Parses a Nominatim search response (a JSON array of places).
///
/// An empty array is a normal "no match", not an error.
pub(crate) fn parse_search_response(
    body: &serde_json::Value,
) -> Result<Option<GeoMatch>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = number_field(first, "lat").ok_or_else(|| GeocodeError::Parse {
        message: "Missing lat in Nominatim response".to_string(),
    })?;
    let lon = number_field(first, "lon").ok_or_else(|| GeocodeError::Parse {
        message: "Missing lon in Nominatim response".to_string(),
    })?;

    let coordinate = Coordinate::new(lat, lon);
    if !coordinate.is_valid() {
        return Err(GeocodeError::Parse {
            message: format!("Coordinate out of range in Nominatim response: {coordinate}"),
        });
    }

    Ok(Some(GeoMatch {
        coordinate,
        display_name: first["display_name"].as_str().map(String::from),
        kind: first["type"].as_str().map(String::from),
        importance: number_field(first, "importance").unwrap_or(0.0),
        bounding_box: parse_bounding_box(&first["boundingbox"]),
    }))
}

fn parse_reverse_response(body: &serde_json::Value) -> Option<String> {
    if body.get("error").is_some() {
        return None;
    }
    body["display_name"]
        .as_str()
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Parses `["lat_min", "lat_max", "lon_min", "lon_max"]`; anything other
/// than four numbers yields `None`.
fn parse_bounding_box(value: &serde_json::Value) -> Option<BoundingBox> {
    let items = value.as_array()?;
    if items.len() != 4 {
        return None;
    }
    let mut out = [0.0; 4];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = as_number(item)?;
    }
    Some(BoundingBox::from_array(out))
}

/// Nominatim encodes most numbers as strings; accept both.
fn number_field(obj: &serde_json::Value, key: &str) -> Option<f64> {
    as_number(obj.get(key)?)
}

fn as_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        serde_json::Value::Number(n) => n.as_f64(),
        _ => None,
    }
}
