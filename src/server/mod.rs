pub mod routes;

use crate::state::AppState;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// JSON surface for the chart layer.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/simulate", get(routes::simulate))
        .route("/api/price", get(routes::get_price))
        .route("/api/sweep", get(routes::get_sweep))
        .route("/api/counters", get(routes::get_counters))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AppConfig, PriceSource, SimulationConfig};
    use crate::feeds::HistoryFeed;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::path::PathBuf;
    use tower::ServiceExt;

    fn test_state(csv_name: &str, csv_body: &str) -> (Arc<AppState>, PathBuf) {
        let path = std::env::temp_dir().join(format!("{csv_name}_{}.csv", std::process::id()));
        std::fs::write(&path, csv_body).unwrap();
        let config = AppConfig {
            simulation: SimulationConfig::default(),
            price_source: PriceSource::Csv,
            price_csv_path: path.clone(),
            yahoo_base_url: String::new(),
            server_port: 0,
        };
        let feed = HistoryFeed::from_config(&config);
        (AppState::new(config, feed), path)
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_price_route() {
        let (state, path) = test_state("route_price", "Date,Close\n");
        let (status, body) = get_json(router(state), "/api/price?spot=100&strike=100").await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["call"].as_f64().unwrap() - 2.3275).abs() < 1e-3);
        assert!(body["parity_gap"].as_f64().unwrap().abs() < 1e-9);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_price_route_rejects_zero_vol() {
        let (state, path) = test_state("route_zero_vol", "Date,Close\n");
        let app = router(state.clone());
        let (status, body) = get_json(app, "/api/price?spot=100&strike=100&volatility=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("volatility"));

        let (_, counters) = get_json(router(state), "/api/counters").await;
        assert_eq!(counters["requests_failed"], 1);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_sweep_route() {
        let (state, path) = test_state("route_sweep", "Date,Close\n");
        let (status, body) = get_json(router(state), "/api/sweep?spot=200").await;
        assert_eq!(status, StatusCode::OK);
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 7);
        assert!((rows[3]["strike"].as_f64().unwrap() - 200.0).abs() < 1e-12);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_simulate_route_from_csv() {
        let mut csv = String::from("Date,Close\n");
        for d in 1..=28 {
            csv.push_str(&format!("2023-02-{d:02},{}\n", 100.0 + d as f64));
        }
        let (state, path) = test_state("route_simulate", &csv);
        let (status, body) = get_json(router(state), "/api/simulate?symbol=TEST&strike=120").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "TEST");
        assert_eq!(body["spot"], 128.0);
        assert_eq!(body["strike"], 120.0);
        assert_eq!(body["signals"].as_array().unwrap().len(), 28);
        assert_eq!(body["sweep"].as_array().unwrap().len(), 7);
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn test_simulate_route_empty_range() {
        let (state, path) = test_state("route_simulate_empty", "Date,Close\n2020-01-02,10\n");
        let (status, _) = get_json(router(state), "/api/simulate").await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let _ = std::fs::remove_file(path);
    }
}
