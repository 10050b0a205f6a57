//! Places text search.
//!
//! Uses the Places Text Search JSON endpoint at
//! `/maps/api/place/textsearch/json`.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::model::PlaceRecord;
use crate::config::DEFAULT_PLACES_URL;
use crate::error::{MomError, MomResult};
use crate::geo::Coordinate;

/// Fields requested for every place.
pub const PLACE_FIELDS: &[&str] = &[
    "name",
    "rating",
    "formatted_address",
    "geometry",
    "formatted_phone_number",
    "opening_hours",
];

/// One text search.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    pub query: String,
    pub location: Coordinate,
    pub radius_m: u32,
    pub fields: &'static [&'static str],
}

/// External places service.
#[async_trait]
pub trait PlacesService: Send + Sync {
    /// Places in the service's own order.
    async fn text_search(&self, credential: &str, request: &TextSearchRequest) -> MomResult<Vec<PlaceRecord>>;
}

/// Google Places HTTP client.
#[derive(Clone)]
pub struct GooglePlacesClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
    error_message: Option<String>,
}

#[derive(Deserialize)]
struct PlaceResult {
    place_id: Option<String>,
    name: Option<String>,
    rating: Option<f64>,
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
    formatted_phone_number: Option<String>,
    opening_hours: Option<OpeningHours>,
}

#[derive(Deserialize)]
struct Geometry {
    location: Option<LatLng>,
}

#[derive(Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct OpeningHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

impl From<PlaceResult> for PlaceRecord {
    fn from(place: PlaceResult) -> Self {
        Self {
            place_id: place.place_id,
            name: place.name,
            rating: place.rating,
            formatted_address: place.formatted_address,
            location: place
                .geometry
                .and_then(|g| g.location)
                .map(|l| Coordinate::new(l.lat, l.lng)),
            phone: place.formatted_phone_number,
            weekday_text: place.opening_hours.map(|h| h.weekday_text).unwrap_or_default(),
        }
    }
}

impl GooglePlacesClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_default();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn default_client() -> Self {
        Self::new(DEFAULT_PLACES_URL)
    }

    pub fn endpoint(&self) -> String {
        format!("{}/maps/api/place/textsearch/json", self.base_url)
    }
}

#[async_trait]
impl PlacesService for GooglePlacesClient {
    async fn text_search(&self, credential: &str, request: &TextSearchRequest) -> MomResult<Vec<PlaceRecord>> {
        let location = request.location.to_string();
        let radius = request.radius_m.to_string();
        let fields = request.fields.join(",");

        debug!(query = %request.query, location = %location, radius = request.radius_m, "Places text search");

        let response = self
            .client
            .get(self.endpoint())
            .query(&[
                ("query", request.query.as_str()),
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("fields", fields.as_str()),
                ("key", credential),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Places request failed");
            return Err(MomError::unavailable(format!("places API error ({status}): {body}")));
        }

        let body = response.text().await?;
        parse_text_search(&body)
    }
}

/// Interpret a text search response body.
pub fn parse_text_search(body: &str) -> MomResult<Vec<PlaceRecord>> {
    let parsed: TextSearchResponse = serde_json::from_str(body)?;

    match parsed.status.as_str() {
        "OK" => Ok(parsed.results.into_iter().map(PlaceRecord::from).collect()),
        "ZERO_RESULTS" => Ok(Vec::new()),
        status => {
            let detail = parsed.error_message.unwrap_or_default();
            warn!(status, detail = %detail, "Places search rejected");
            Err(MomError::unavailable(if detail.is_empty() {
                status.to_string()
            } else {
                format!("{status}: {detail}")
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ok() {
        let body = r#"{
            "status": "OK",
            "results": [
                {
                    "place_id": "p1",
                    "name": "Skin Clinic",
                    "rating": 4.7,
                    "formatted_address": "10 Main St",
                    "geometry": { "location": { "lat": 40.1, "lng": -3.2 } },
                    "opening_hours": { "open_now": true, "weekday_text": ["Monday: 9-5", "Tuesday: 9-5"] }
                },
                { "name": "Bare" }
            ]
        }"#;
        let places = parse_text_search(body).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].place_id.as_deref(), Some("p1"));
        assert_eq!(places[0].location, Some(Coordinate::new(40.1, -3.2)));
        assert_eq!(places[0].weekday_text.len(), 2);
        assert_eq!(places[1].name.as_deref(), Some("Bare"));
        assert!(places[1].location.is_none());
    }

    #[test]
    fn test_zero_results() {
        let places = parse_text_search(r#"{"status":"ZERO_RESULTS","results":[]}"#).unwrap();
        assert!(places.is_empty());
    }

    #[test]
    fn test_request_denied() {
        let err = parse_text_search(
            r#"{"status":"REQUEST_DENIED","results":[],"error_message":"The provided API key is invalid."}"#,
        )
        .unwrap_err();
        match err {
            MomError::ServiceUnavailable(msg) => {
                assert_eq!(msg, "REQUEST_DENIED: The provided API key is invalid.")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(parse_text_search("<html>"), Err(MomError::Json(_))));
    }

    #[tokio::test]
    async fn test_transport_error_hides_credential() {
        let client = GooglePlacesClient::new("http://127.0.0.1:1");
        let request = TextSearchRequest {
            query: "doctor".into(),
            location: Coordinate::new(48.85, 2.35),
            radius_m: 10_000,
            fields: PLACE_FIELDS,
        };

        let err = client.text_search("SECRET-KEY-123", &request).await.unwrap_err();
        assert!(matches!(err, MomError::Http(_)));
        assert!(!err.to_string().contains("SECRET-KEY-123"), "{err}");
        assert!(!format!("{err:?}").contains("SECRET-KEY-123"));
    }

    #[test]
    fn test_endpoint() {
        let client = GooglePlacesClient::new("http://localhost:9999/");
        assert_eq!(client.endpoint(), "http://localhost:9999/maps/api/place/textsearch/json");
    }
}
