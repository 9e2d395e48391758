use crate::errors::{SimError, SimResult};
use crate::models::sweep::default_offsets;
use crate::state::MarketParams;
use chrono::NaiveDate;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Yahoo,
    Csv,
}

/// Inputs for one simulation run. Passed explicitly into every call.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub symbol: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// None prices at the money.
    pub strike: Option<f64>,
    pub days_to_expiry: f64,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub short_window: usize,
    pub long_window: usize,
    pub strike_offsets: Vec<f64>,
}

impl SimulationConfig {
    #[inline]
    pub fn market_params(&self) -> MarketParams {
        MarketParams::from_days(self.days_to_expiry, self.risk_free_rate, self.volatility)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            symbol: "AAPL".into(),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or(NaiveDate::MIN),
            strike: None,
            days_to_expiry: 30.0,
            risk_free_rate: 0.01,
            volatility: 0.2,
            short_window: 9,
            long_window: 20,
            strike_offsets: default_offsets(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub simulation: SimulationConfig,
    pub price_source: PriceSource,
    pub price_csv_path: PathBuf,
    pub yahoo_base_url: String,
    pub server_port: u16,
}

impl AppConfig {
    pub fn from_env() -> SimResult<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SimResult<Self> {
        let defaults = SimulationConfig::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let simulation = SimulationConfig {
            symbol: get("SYMBOL").unwrap_or(defaults.symbol),
            start_date: parse_or("START_DATE", get("START_DATE"), defaults.start_date, parse_date)?,
            end_date: parse_or("END_DATE", get("END_DATE"), defaults.end_date, parse_date)?,
            strike: match get("STRIKE_PRICE") {
                Some(raw) => Some(parse_num::<f64>(&raw).map_err(|e| config_err("STRIKE_PRICE", e))?),
                None => None,
            },
            days_to_expiry: parse_or("DAYS_TO_EXPIRY", get("DAYS_TO_EXPIRY"), defaults.days_to_expiry, parse_num)?,
            risk_free_rate: parse_or("RISK_FREE_RATE", get("RISK_FREE_RATE"), defaults.risk_free_rate, parse_num)?,
            volatility: parse_or("VOLATILITY", get("VOLATILITY"), defaults.volatility, parse_num)?,
            short_window: parse_or("SHORT_WINDOW", get("SHORT_WINDOW"), defaults.short_window, parse_num)?,
            long_window: parse_or("LONG_WINDOW", get("LONG_WINDOW"), defaults.long_window, parse_num)?,
            strike_offsets: parse_or("STRIKE_OFFSETS", get("STRIKE_OFFSETS"), defaults.strike_offsets, parse_offsets)?,
        };

        let price_source = match get("PRICE_SOURCE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("yahoo") => PriceSource::Yahoo,
            Some("csv") => PriceSource::Csv,
            Some(other) => return Err(config_err("PRICE_SOURCE", format!("unknown source {other:?}"))),
        };

        validate(&simulation)?;

        let server_port = parse_or("SERVER_PORT", get("SERVER_PORT"), 3001u16, parse_num)?;

        Ok(Self {
            simulation,
            price_source,
            price_csv_path: PathBuf::from(get("PRICE_CSV_PATH").unwrap_or_else(|| "data/prices.csv".into())),
            yahoo_base_url: get("YAHOO_BASE_URL")
                .unwrap_or_else(|| "https://query1.finance.yahoo.com".into()),
            server_port,
        })
    }
}

/// Range and cross-field checks on the parsed simulation defaults.
fn validate(sim: &SimulationConfig) -> SimResult<()> {
    if sim.start_date >= sim.end_date {
        return Err(config_err("END_DATE", format!("{} is not after START_DATE {}", sim.end_date, sim.start_date)));
    }
    if let Some(k) = sim.strike {
        if !k.is_finite() || k <= 0.0 {
            return Err(config_err("STRIKE_PRICE", format!("must be > 0, got {k}")));
        }
    }
    let positive = [("DAYS_TO_EXPIRY", sim.days_to_expiry), ("VOLATILITY", sim.volatility)];
    for (key, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(config_err(key, format!("must be > 0, got {value}")));
        }
    }
    if !sim.risk_free_rate.is_finite() {
        return Err(config_err("RISK_FREE_RATE", format!("must be finite, got {}", sim.risk_free_rate)));
    }
    if sim.short_window == 0 {
        return Err(config_err("SHORT_WINDOW", "must be >= 1"));
    }
    if sim.long_window <= sim.short_window {
        return Err(config_err(
            "LONG_WINDOW",
            format!("{} must exceed SHORT_WINDOW {}", sim.long_window, sim.short_window),
        ));
    }
    if let Some(bad) = sim.strike_offsets.iter().find(|o| !o.is_finite() || **o <= -1.0) {
        return Err(config_err("STRIKE_OFFSETS", format!("offset {bad} must be finite and > -1")));
    }
    if let Some(w) = sim.strike_offsets.windows(2).find(|w| w[1] <= w[0]) {
        return Err(config_err(
            "STRIKE_OFFSETS",
            format!("must be strictly ascending ({} then {})", w[0], w[1]),
        ));
    }
    Ok(())
}

fn config_err(key: &str, e: impl std::fmt::Display) -> SimError {
    SimError::Config(format!("{key}: {e}"))
}

fn parse_or<T>(
    key: &str,
    raw: Option<String>,
    default: T,
    parse: fn(&str) -> Result<T, String>,
) -> SimResult<T> {
    match raw {
        Some(v) => parse(&v).map_err(|e| config_err(key, e)),
        None => Ok(default),
    }
}

fn parse_num<T: std::str::FromStr>(raw: &str) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(|e| format!("{raw:?}: {e}"))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| format!("{raw:?}: {e}"))
}

fn parse_offsets(raw: &str) -> Result<Vec<f64>, String> {
    raw.split(',').map(parse_num::<f64>).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_map(pairs: &[(&str, &str)]) -> SimResult<AppConfig> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults() {
        let cfg = from_map(&[]).unwrap();
        assert_eq!(cfg.simulation, SimulationConfig::default());
        assert_eq!(cfg.price_source, PriceSource::Yahoo);
        assert_eq!(cfg.server_port, 3001);
        assert_eq!(cfg.simulation.short_window, 9);
        assert_eq!(cfg.simulation.long_window, 20);
        assert_eq!(cfg.simulation.strike_offsets.len(), 7);
    }

    #[test]
    fn test_overrides() {
        let cfg = from_map(&[
            ("SYMBOL", "MSFT"),
            ("STRIKE_PRICE", "150"),
            ("VOLATILITY", "0.35"),
            ("STRIKE_OFFSETS", "-0.1, 0, 0.1"),
            ("PRICE_SOURCE", "CSV"),
            ("START_DATE", "2022-06-01"),
        ])
        .unwrap();
        assert_eq!(cfg.simulation.symbol, "MSFT");
        assert_eq!(cfg.simulation.strike, Some(150.0));
        assert_eq!(cfg.simulation.volatility, 0.35);
        assert_eq!(cfg.simulation.strike_offsets, vec![-0.1, 0.0, 0.1]);
        assert_eq!(cfg.price_source, PriceSource::Csv);
        assert_eq!(cfg.simulation.start_date, NaiveDate::from_ymd_opt(2022, 6, 1).unwrap());
    }

    #[test]
    fn test_bad_value_names_variable() {
        let err = from_map(&[("LONG_WINDOW", "twenty")]).unwrap_err();
        assert!(matches!(err, SimError::Config(msg) if msg.starts_with("LONG_WINDOW")));
    }

    #[test]
    fn test_window_order_rejected() {
        let err = from_map(&[("SHORT_WINDOW", "20"), ("LONG_WINDOW", "9")]).unwrap_err();
        assert!(matches!(err, SimError::Config(msg) if msg.starts_with("LONG_WINDOW")));
        assert!(from_map(&[("SHORT_WINDOW", "0")]).is_err());
    }

    #[test]
    fn test_unordered_offsets_rejected() {
        let err = from_map(&[("STRIKE_OFFSETS", "0.1,0,-0.1")]).unwrap_err();
        assert!(matches!(err, SimError::Config(msg) if msg.starts_with("STRIKE_OFFSETS")));
        assert!(from_map(&[("STRIKE_OFFSETS", "-1.5,0")]).is_err());
        assert!(from_map(&[("STRIKE_OFFSETS", "0,NaN")]).is_err());
    }

    #[test]
    fn test_non_positive_pricing_inputs_rejected() {
        for (key, value) in [("STRIKE_PRICE", "-5"), ("VOLATILITY", "0"), ("DAYS_TO_EXPIRY", "0")] {
            let err = from_map(&[(key, value)]).unwrap_err();
            assert!(matches!(&err, SimError::Config(msg) if msg.starts_with(key)), "{key}: {err}");
        }
    }

    #[test]
    fn test_inverted_dates_rejected() {
        let err = from_map(&[("START_DATE", "2024-01-01"), ("END_DATE", "2023-01-01")]).unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_unknown_source_rejected() {
        assert!(from_map(&[("PRICE_SOURCE", "bloomberg")]).is_err());
    }

    #[test]
    fn test_market_params() {
        let m = SimulationConfig::default().market_params();
        assert!((m.time_to_expiry - 30.0 / 365.0).abs() < 1e-15);
        assert_eq!(m.risk_free_rate, 0.01);
        assert_eq!(m.volatility, 0.2);
    }
}
