use crate::config::SimulationConfig;
use crate::errors::{SimError, SimResult};
use crate::models::sweep;
use crate::models::OptionPricer;
use crate::signals;
use crate::state::{Crossover, OptionQuote, PriceSeries, SignalSeries, StrikeSweepResult};

/// Everything the chart layer needs from one run: the price/EMA overlay,
/// the headline call/put pair, and the strike table.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SimulationReport {
    pub symbol: String,
    pub model: &'static str,
    pub spot: f64,
    pub strike: f64,
    pub quote: OptionQuote,
    pub title: String,
    pub short_window: usize,
    pub long_window: usize,
    pub signals: SignalSeries,
    pub crossovers: Vec<Crossover>,
    pub sweep: StrikeSweepResult,
}

/// Run the signal engine, the headline price and the strike sweep over one
/// price history. Spot is the last close; the headline strike defaults to spot.
pub fn run_simulation(
    pricer: &dyn OptionPricer,
    config: &SimulationConfig,
    series: &PriceSeries,
) -> SimResult<SimulationReport> {
    let signals = signals::compute_signal(series, config.short_window, config.long_window)?;

    let spot = series
        .last_close()
        .ok_or_else(|| SimError::InsufficientData("price series is empty".into()))?;
    let strike = config.strike.unwrap_or(spot);

    let base = config.market_params();
    let quote = pricer.price(&base.with_strike(spot, strike)?)?;
    let sweep = sweep::sweep(pricer, spot, &base, &config.strike_offsets)?;
    let crossovers = signals.crossovers();

    tracing::info!(
        symbol = %config.symbol,
        spot = spot,
        strike = strike,
        call = quote.call,
        put = quote.put,
        points = signals.len(),
        last_signal = signals.points().last().map_or(0, |p| p.signal),
        crossovers = crossovers.len(),
        "simulation complete"
    );
    for row in sweep.rows() {
        tracing::debug!(strike = row.strike, call = row.call, put = row.put, "strike row");
    }

    Ok(SimulationReport {
        title: headline(&config.symbol, &quote, strike),
        symbol: config.symbol.clone(),
        model: pricer.name(),
        spot,
        strike,
        quote,
        short_window: config.short_window,
        long_window: config.long_window,
        signals,
        crossovers,
        sweep,
    })
}

fn headline(symbol: &str, quote: &OptionQuote, strike: f64) -> String {
    format!(
        "{symbol} | Call: ${:.2}, Put: ${:.2} | Strike Price: {strike:.2}",
        quote.call, quote.put
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::black_scholes::BlackScholes;
    use crate::state::PricePoint;
    use chrono::{Duration, TimeZone, Utc};

    fn series(closes: &[f64]) -> PriceSeries {
        let start = Utc.with_ymd_and_hms(2023, 1, 3, 0, 0, 0).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                timestamp: start + Duration::days(i as i64),
                close,
            })
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn test_atm_report() {
        let closes: Vec<f64> = (0..40).map(|i| 90.0 + i as f64 * 0.25).collect();
        let cfg = SimulationConfig::default();
        let report = run_simulation(&BlackScholes::new(), &cfg, &series(&closes)).unwrap();

        assert_eq!(report.spot, 99.75);
        assert_eq!(report.strike, 99.75);
        assert_eq!(report.signals.len(), 40);
        assert_eq!(report.sweep.len(), 7);
        assert_eq!(report.sweep.rows()[3].strike, report.spot);
        assert_eq!(report.sweep.rows()[3].call, report.quote.call);
        assert_eq!(report.model, "Black-Scholes");
        assert!(report.title.starts_with("AAPL | Call: $"));
    }

    #[test]
    fn test_explicit_strike() {
        let cfg = SimulationConfig {
            strike: Some(100.0),
            ..SimulationConfig::default()
        };
        let report = run_simulation(&BlackScholes::new(), &cfg, &series(&[100.0])).unwrap();
        assert!((report.quote.call - 2.3275).abs() < 1e-3);
        assert_eq!(report.title, "AAPL | Call: $2.33, Put: $2.25 | Strike Price: 100.00");
    }

    #[test]
    fn test_empty_series_fails() {
        let err = run_simulation(&BlackScholes::new(), &SimulationConfig::default(), &PriceSeries::default())
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientData(_)));
    }

    #[test]
    fn test_invalid_volatility_fails() {
        let cfg = SimulationConfig {
            volatility: 0.0,
            ..SimulationConfig::default()
        };
        let err = run_simulation(&BlackScholes::new(), &cfg, &series(&[100.0, 101.0])).unwrap_err();
        assert!(matches!(err, SimError::InvalidParameter(_)));
    }

    #[test]
    fn test_report_serializes() {
        let report =
            run_simulation(&BlackScholes::new(), &SimulationConfig::default(), &series(&[50.0, 51.0])).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["signals"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["sweep"].as_array().map(Vec::len), Some(7));
        assert!(json["quote"]["call"].is_number());
    }
}
