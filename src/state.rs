use crate::config::AppConfig;
use crate::errors::{SimError, SimResult};
use crate::feeds::HistoryFeed;
use crate::models::black_scholes::BlackScholes;
use chrono::{DateTime, Utc};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Days per year used to turn a days-to-expiry count into a year fraction.
pub const DAYS_PER_YEAR: f64 = 365.0;

// ── Pricing inputs (stack, no alloc) ──

/// Validated inputs for one option evaluation.
///
/// Fields are private so an instance can only exist once the domain checks
/// have passed. The formula's building blocks are precomputed on construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParameters {
    spot: f64,
    strike: f64,
    time_to_expiry: f64,
    risk_free_rate: f64,
    // Precomputed
    ln_s_k: f64,
    sigma_sqrt_t: f64,
    half_sigma_sq: f64,
    discount: f64,
}

impl PricingParameters {
    pub fn new(
        spot: f64,
        strike: f64,
        time_to_expiry: f64,
        risk_free_rate: f64,
        volatility: f64,
    ) -> SimResult<Self> {
        let inputs = [
            ("spot", spot),
            ("strike", strike),
            ("time_to_expiry", time_to_expiry),
            ("risk_free_rate", risk_free_rate),
            ("volatility", volatility),
        ];
        for (name, value) in inputs {
            if !value.is_finite() {
                return Err(SimError::InvalidParameter(format!("{name} must be finite, got {value}")));
            }
        }
        if spot <= 0.0 {
            return Err(SimError::InvalidParameter(format!("spot must be > 0, got {spot}")));
        }
        if strike <= 0.0 {
            return Err(SimError::InvalidParameter(format!("strike must be > 0, got {strike}")));
        }
        if time_to_expiry <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "time_to_expiry must be > 0, got {time_to_expiry}"
            )));
        }
        if volatility <= 0.0 {
            return Err(SimError::InvalidParameter(format!(
                "volatility must be > 0, got {volatility}"
            )));
        }

        Ok(Self {
            spot,
            strike,
            time_to_expiry,
            risk_free_rate,
            ln_s_k: (spot / strike).ln(),
            sigma_sqrt_t: volatility * time_to_expiry.sqrt(),
            half_sigma_sq: 0.5 * volatility * volatility,
            discount: (-risk_free_rate * time_to_expiry).exp(),
        })
    }

    #[inline]
    pub fn spot(&self) -> f64 {
        self.spot
    }

    #[inline]
    pub fn strike(&self) -> f64 {
        self.strike
    }

    #[inline]
    pub fn time_to_expiry(&self) -> f64 {
        self.time_to_expiry
    }

    #[inline]
    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    #[inline]
    pub fn ln_s_k(&self) -> f64 {
        self.ln_s_k
    }

    #[inline]
    pub fn sigma_sqrt_t(&self) -> f64 {
        self.sigma_sqrt_t
    }

    #[inline]
    pub fn half_sigma_sq(&self) -> f64 {
        self.half_sigma_sq
    }

    /// e^(-rT)
    #[inline]
    pub fn discount(&self) -> f64 {
        self.discount
    }
}

/// Everything needed to price except spot and strike. Held fixed across a sweep.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketParams {
    pub time_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
}

impl MarketParams {
    pub fn from_days(days_to_expiry: f64, risk_free_rate: f64, volatility: f64) -> Self {
        Self {
            time_to_expiry: days_to_expiry / DAYS_PER_YEAR,
            risk_free_rate,
            volatility,
        }
    }

    #[inline]
    pub fn with_strike(&self, spot: f64, strike: f64) -> SimResult<PricingParameters> {
        PricingParameters::new(
            spot,
            strike,
            self.time_to_expiry,
            self.risk_free_rate,
            self.volatility,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct OptionQuote {
    pub call: f64,
    pub put: f64,
}

// ── Price history ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
}

/// Chronological close prices supplied by a feed. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Builds a series, rejecting non-positive closes and out-of-order timestamps.
    /// An empty series is allowed; consumers that need data report it.
    pub fn new(points: Vec<PricePoint>) -> SimResult<Self> {
        for (i, p) in points.iter().enumerate() {
            if !p.close.is_finite() || p.close <= 0.0 {
                return Err(SimError::InvalidParameter(format!(
                    "close at {} must be a positive number, got {}",
                    p.timestamp, p.close
                )));
            }
            if i > 0 && points[i - 1].timestamp >= p.timestamp {
                return Err(SimError::InvalidParameter(format!(
                    "timestamps not strictly ascending at {}",
                    p.timestamp
                )));
            }
        }
        Ok(Self { points })
    }

    #[inline]
    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Most recent close, used as the current spot.
    #[inline]
    pub fn last_close(&self) -> Option<f64> {
        self.points.last().map(|p| p.close)
    }
}

// ── Signal output ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SignalPoint {
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub short_ema: f64,
    pub long_ema: f64,
    pub signal: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrossDirection {
    /// Short EMA moved above the long EMA.
    Bullish,
    /// Short EMA fell back to or below the long EMA.
    Bearish,
}

impl std::fmt::Display for CrossDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct Crossover {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub direction: CrossDirection,
}

/// EMA overlay and crossover signal, one point per input price.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct SignalSeries {
    points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub(crate) fn from_points(points: Vec<SignalPoint>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn points(&self) -> &[SignalPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Steps where the signal flips.
    pub fn crossovers(&self) -> Vec<Crossover> {
        self.points
            .windows(2)
            .enumerate()
            .filter(|(_, w)| w[0].signal != w[1].signal)
            .map(|(i, w)| Crossover {
                index: i + 1,
                timestamp: w[1].timestamp,
                direction: if w[1].signal == 1 {
                    CrossDirection::Bullish
                } else {
                    CrossDirection::Bearish
                },
            })
            .collect()
    }
}

// ── Strike sweep output ──

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct StrikeQuote {
    pub strike: f64,
    pub call: f64,
    pub put: f64,
}

/// Call/put prices by strictly ascending strike.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(transparent)]
pub struct StrikeSweepResult {
    rows: Vec<StrikeQuote>,
}

impl StrikeSweepResult {
    pub(crate) fn from_rows(rows: Vec<StrikeQuote>) -> Self {
        Self { rows }
    }

    #[inline]
    pub fn rows(&self) -> &[StrikeQuote] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

// ── Performance Counters (lock-free) ──

pub struct PerfCounters {
    pub simulations_run: AtomicU64,
    pub prices_computed: AtomicU64,
    pub sweeps_run: AtomicU64,
    pub requests_failed: AtomicU64,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self {
            simulations_run: AtomicU64::new(0),
            prices_computed: AtomicU64::new(0),
            sweeps_run: AtomicU64::new(0),
            requests_failed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state (immutable apart from counters) ──

pub struct AppState {
    pub config: AppConfig,
    pub feed: HistoryFeed,
    pub pricer: BlackScholes,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, feed: HistoryFeed) -> Arc<Self> {
        Arc::new(Self {
            config,
            feed,
            pricer: BlackScholes::new(),
            counters: PerfCounters::new(),
        })
    }
}
