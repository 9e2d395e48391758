use crate::config::{self, SimulationConfig};
use crate::errors::{SimError, SimResult};
use crate::models::{sweep, OptionPricer};
use crate::simulation;
use crate::state::{AppState, MarketParams, PerfCounters};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::sync::Arc;

#[derive(Debug, Default, serde::Deserialize)]
pub struct SimulateQuery {
    pub symbol: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub strike: Option<f64>,
    pub short_window: Option<usize>,
    pub long_window: Option<usize>,
    pub days: Option<f64>,
    pub rate: Option<f64>,
    pub volatility: Option<f64>,
}

impl SimulateQuery {
    /// Overlay the query on the configured defaults.
    fn apply(self, defaults: &SimulationConfig) -> SimResult<SimulationConfig> {
        let parse = |raw: String| {
            config::parse_date(&raw).map_err(|e| SimError::InvalidParameter(format!("date {e}")))
        };
        Ok(SimulationConfig {
            symbol: self.symbol.unwrap_or_else(|| defaults.symbol.clone()),
            start_date: self.start.map(parse).transpose()?.unwrap_or(defaults.start_date),
            end_date: self.end.map(parse).transpose()?.unwrap_or(defaults.end_date),
            strike: self.strike.or(defaults.strike),
            days_to_expiry: self.days.unwrap_or(defaults.days_to_expiry),
            risk_free_rate: self.rate.unwrap_or(defaults.risk_free_rate),
            volatility: self.volatility.unwrap_or(defaults.volatility),
            short_window: self.short_window.unwrap_or(defaults.short_window),
            long_window: self.long_window.unwrap_or(defaults.long_window),
            strike_offsets: defaults.strike_offsets.clone(),
        })
    }
}

#[derive(serde::Deserialize)]
pub struct PriceQuery {
    pub spot: f64,
    pub strike: f64,
    pub days: Option<f64>,
    pub rate: Option<f64>,
    pub volatility: Option<f64>,
}

#[derive(serde::Deserialize)]
pub struct SweepQuery {
    pub spot: f64,
    pub days: Option<f64>,
    pub rate: Option<f64>,
    pub volatility: Option<f64>,
}

fn market_params(
    defaults: &SimulationConfig,
    days: Option<f64>,
    rate: Option<f64>,
    volatility: Option<f64>,
) -> MarketParams {
    MarketParams::from_days(
        days.unwrap_or(defaults.days_to_expiry),
        rate.unwrap_or(defaults.risk_free_rate),
        volatility.unwrap_or(defaults.volatility),
    )
}

fn status_for(e: &SimError) -> StatusCode {
    match e {
        SimError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
        SimError::InsufficientData(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SimError::Feed(_) | SimError::Network(_) | SimError::Parse(_) => StatusCode::BAD_GATEWAY,
        SimError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(state: &AppState, e: SimError) -> Response {
    PerfCounters::bump(&state.counters.requests_failed);
    let status = status_for(&e);
    tracing::warn!(error = %e, status = status.as_u16(), "request failed");
    (status, Json(serde_json::json!({ "error": e.to_string() }))).into_response()
}

/// GET /api/simulate -- fetch history, then signals + headline price + sweep
pub async fn simulate(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SimulateQuery>,
) -> Response {
    let cfg = match params.apply(&state.config.simulation) {
        Ok(c) => c,
        Err(e) => return error_response(&state, e),
    };

    let series = match state.feed.fetch(&cfg.symbol, cfg.start_date, cfg.end_date).await {
        Ok(s) => s,
        Err(e) => return error_response(&state, e),
    };

    match simulation::run_simulation(&state.pricer, &cfg, &series) {
        Ok(report) => {
            PerfCounters::bump(&state.counters.simulations_run);
            Json(report).into_response()
        }
        Err(e) => error_response(&state, e),
    }
}

/// GET /api/price -- single call/put pair (pure, no feed)
pub async fn get_price(
    State(state): State<Arc<AppState>>,
    Query(q): Query<PriceQuery>,
) -> Response {
    let base = market_params(&state.config.simulation, q.days, q.rate, q.volatility);
    let result = base
        .with_strike(q.spot, q.strike)
        .and_then(|params| state.pricer.price(&params).map(|quote| (params, quote)));

    match result {
        Ok((params, quote)) => {
            PerfCounters::bump(&state.counters.prices_computed);
            let parity_gap = quote.call - quote.put - (params.spot() - params.strike() * params.discount());
            Json(serde_json::json!({
                "model": state.pricer.name(),
                "spot": params.spot(),
                "strike": params.strike(),
                "call": quote.call,
                "put": quote.put,
                "parity_gap": parity_gap,
            }))
            .into_response()
        }
        Err(e) => error_response(&state, e),
    }
}

/// GET /api/sweep -- strike table around spot with the configured offsets
pub async fn get_sweep(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SweepQuery>,
) -> Response {
    let base = market_params(&state.config.simulation, q.days, q.rate, q.volatility);
    match sweep::sweep(&state.pricer, q.spot, &base, &state.config.simulation.strike_offsets) {
        Ok(result) => {
            PerfCounters::bump(&state.counters.sweeps_run);
            Json(result).into_response()
        }
        Err(e) => error_response(&state, e),
    }
}

/// GET /api/counters -- request counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    use portable_atomic::Ordering::Relaxed;
    Json(serde_json::json!({
        "simulations_run": state.counters.simulations_run.load(Relaxed),
        "prices_computed": state.counters.prices_computed.load(Relaxed),
        "sweeps_run": state.counters.sweeps_run.load(Relaxed),
        "requests_failed": state.counters.requests_failed.load(Relaxed),
    }))
}

pub async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_overrides_defaults() {
        let defaults = SimulationConfig::default();
        let q = SimulateQuery {
            symbol: Some("MSFT".into()),
            start: Some("2022-01-01".into()),
            volatility: Some(0.3),
            ..SimulateQuery::default()
        };
        let cfg = q.apply(&defaults).unwrap();
        assert_eq!(cfg.symbol, "MSFT");
        assert_eq!(cfg.start_date.to_string(), "2022-01-01");
        assert_eq!(cfg.end_date, defaults.end_date);
        assert_eq!(cfg.volatility, 0.3);
        assert_eq!(cfg.short_window, 9);
    }

    #[test]
    fn test_bad_query_date() {
        let q = SimulateQuery {
            end: Some("31/12/2023".into()),
            ..SimulateQuery::default()
        };
        assert!(matches!(
            q.apply(&SimulationConfig::default()),
            Err(SimError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&SimError::InvalidParameter("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(&SimError::InsufficientData("x".into())),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(status_for(&SimError::Feed("x".into())), StatusCode::BAD_GATEWAY);
    }
}
