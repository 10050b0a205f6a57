//! MOM Web Server
//!
//! Axum-based server exposing skin scans, their live analysis progress and
//! the healthcare provider search.

pub mod error;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use mom_core::config::MomConfig;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use state::AppState;

/// Largest accepted request body. Photos arrive as base64 data URLs, a third
/// larger than the camera still itself.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/health", get(routes::dashboard::health))
        // Scans
        .route(
            "/scans",
            get(routes::scans::list_scans).post(routes::scans::create_scan),
        )
        .route(
            "/scans/{id}",
            get(routes::scans::get_scan).delete(routes::scans::delete_scan),
        )
        .route("/scans/{id}/report", get(routes::scans::get_report))
        .route("/scans/{id}/report.md", get(routes::scans::download_report))
        // Providers
        .route(
            "/providers/categories",
            get(routes::providers::list_categories),
        )
        .route("/providers/search", post(routes::providers::search))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state.clone());

    Router::new()
        .route("/", get(routes::dashboard::index))
        .nest("/api", api_routes)
        .route("/ws/scans/{id}", get(websocket::scan_progress))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Run the web server.
pub async fn run_server(config: MomConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = AppState::new(config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Web server listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use base64::Engine as _;
    use mom_core::analysis::engine::StubEngine;
    use mom_core::geo::Coordinate;
    use mom_core::locator::model::PlaceRecord;
    use mom_core::locator::places::{PlacesService, TextSearchRequest};
    use mom_core::MomResult;
    use serde_json::{json, Value};
    use std::io::Cursor;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FakePlaces;

    #[async_trait]
    impl PlacesService for FakePlaces {
        async fn text_search(
            &self,
            credential: &str,
            request: &TextSearchRequest,
        ) -> MomResult<Vec<PlaceRecord>> {
            assert_eq!(credential, "test-key");
            assert_eq!(request.query, "pharmacy");
            Ok(vec![PlaceRecord {
                place_id: Some("p1".into()),
                name: Some("Corner Pharmacy".into()),
                rating: Some(4.2),
                location: Some(Coordinate::new(48.8606, 2.3376)),
                ..Default::default()
            }])
        }
    }

    fn fake_state() -> AppState {
        AppState::with_services(MomConfig::default(), Arc::new(StubEngine), Arc::new(FakePlaces))
    }

    fn app() -> Router {
        create_router(fake_state())
    }

    /// A PNG of pseudo-random noise, which barely compresses.
    fn noise_png_data_url(width: u32, height: u32) -> String {
        let mut seed: u32 = 0x9E37_79B9;
        let img = image::RgbImage::from_fn(width, height, |_, _| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let [r, g, b, _] = seed.to_le_bytes();
            image::Rgb([r, g, b])
        });
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    fn png_data_url() -> String {
        let img = image::RgbImage::from_pixel(8, 6, image::Rgb([200, 120, 110]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(buf.into_inner())
        )
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let res = app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_create_scan_then_report_not_ready() {
        let app = app();
        let res = app
            .clone()
            .oneshot(post_json(
                "/api/scans",
                json!({ "image": png_data_url(), "source": "gallery" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = json_body(res).await;
        assert_eq!(body["source"], "gallery");
        assert_eq!(body["width"], 8);
        assert_eq!(body["state"]["state"], "analyzing");
        assert_eq!(body["notice"]["title"], "Photo selected successfully");

        let id = body["id"].as_str().unwrap().to_string();
        let res = app
            .clone()
            .oneshot(
                Request::get(format!("/api/scans/{id}/report"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(res).await["kind"], "not_ready");

        let res = app
            .oneshot(
                Request::delete(format!("/api/scans/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_create_scan_reencodes_upload() {
        let state = fake_state();
        let res = create_router(state.clone())
            .oneshot(post_json("/api/scans", json!({ "image": png_data_url() })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);

        let body = json_body(res).await;
        let id: uuid::Uuid = body["id"].as_str().unwrap().parse().unwrap();
        let entry = state.scan(&id).await.unwrap();
        assert_eq!(entry.image.mime_type, "image/jpeg");
        assert!(entry.image.data_url.starts_with("data:image/jpeg;base64,"));
        assert_eq!((entry.image.width, entry.image.height), (8, 6));
    }

    #[tokio::test]
    async fn test_create_scan_accepts_phone_sized_photo() {
        let image = noise_png_data_url(1100, 1100);
        assert!(image.len() > 2 * 1024 * 1024, "payload is only {} bytes", image.len());

        let res = app()
            .oneshot(post_json("/api/scans", json!({ "image": image, "source": "camera" })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = json_body(res).await;
        assert_eq!(body["width"], 1100);
    }

    #[tokio::test]
    async fn test_create_scan_too_large_gets_notice() {
        let image = format!("data:image/png;base64,{}", "A".repeat(MAX_UPLOAD_BYTES));
        let res = app()
            .oneshot(post_json("/api/scans", json!({ "image": image })))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let body = json_body(res).await;
        assert_eq!(body["kind"], "payload_too_large");
        assert_eq!(body["notice"]["title"], "Photo too large");
        assert_eq!(body["notice"]["variant"], "destructive");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_notice() {
        let res = app()
            .oneshot(
                Request::post("/api/scans")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn test_create_scan_rejects_non_image() {
        let res = app()
            .oneshot(post_json(
                "/api/scans",
                json!({ "image": "data:text/plain;base64,aGVsbG8=" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_scan() {
        let res = app()
            .oneshot(
                Request::get(format!("/api/scans/{}", uuid::Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = app()
            .oneshot(Request::get("/api/scans/not-a-uuid").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_provider_search_requires_credential() {
        let res = app()
            .oneshot(post_json(
                "/api/providers/search",
                json!({ "category": "dermatologist", "lat": 48.8566, "lng": 2.3522 }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(res).await["notice"]["title"], "API Key Required");
    }

    #[tokio::test]
    async fn test_places_failure_does_not_expose_server_key() {
        let mut config = MomConfig::default();
        config.places.api_key = Some("SERVER-SECRET-KEY-123".into());
        config.places.base_url = "http://127.0.0.1:1".into();

        let res = create_router(AppState::new(config))
            .oneshot(post_json(
                "/api/providers/search",
                json!({ "category": "doctor", "lat": 48.85, "lng": 2.35 }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);

        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(!text.contains("SERVER-SECRET-KEY-123"), "{text}");

        let body: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body["kind"], "service_unavailable");
        assert_eq!(body["notice"]["title"], "Search Error");
        assert!(body["notice"].get("cause").is_none());
    }

    #[tokio::test]
    async fn test_provider_search() {
        let res = app()
            .oneshot(post_json(
                "/api/providers/search",
                json!({
                    "category": "pharmacy",
                    "lat": 48.8566,
                    "lng": 2.3522,
                    "api_key": "test-key"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = json_body(res).await;
        assert_eq!(body["label"], "Pharmacies");
        let providers = body["providers"].as_array().unwrap();
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0]["name"], "Corner Pharmacy");
        assert_eq!(providers[0]["address"], "Address not available");
        assert_eq!(providers[0]["marker_color"], "#16a34a");
        assert!(providers[0]["distance"].as_str().unwrap().ends_with("km"));
    }

    #[tokio::test]
    async fn test_provider_search_rejects_bad_coordinate() {
        let res = app()
            .oneshot(post_json(
                "/api/providers/search",
                json!({ "category": "doctor", "lat": 123.0, "lng": 0.0, "api_key": "k" }),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
