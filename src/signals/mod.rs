pub mod ema;

use crate::errors::{SimError, SimResult};
use crate::state::{PriceSeries, SignalPoint, SignalSeries};
use ema::Ema;

/// EMA crossover signal over a price series.
///
/// signal = 1 when short EMA > long EMA, else 0. One output point per input
/// point. Pure function: same series and windows always give the same output.
pub fn compute_signal(
    series: &PriceSeries,
    short_window: usize,
    long_window: usize,
) -> SimResult<SignalSeries> {
    if series.is_empty() {
        return Err(SimError::InsufficientData("price series is empty".into()));
    }
    if short_window == 0 {
        return Err(SimError::InvalidParameter("short window must be >= 1".into()));
    }
    if long_window <= short_window {
        return Err(SimError::InvalidParameter(format!(
            "long window ({long_window}) must exceed short window ({short_window})"
        )));
    }

    let mut short = Ema::new(short_window);
    let mut long = Ema::new(long_window);

    let points = series
        .points()
        .iter()
        .map(|p| {
            let short_ema = short.update(p.close);
            let long_ema = long.update(p.close);
            SignalPoint {
                timestamp: p.timestamp,
                close: p.close,
                short_ema,
                long_ema,
                signal: u8::from(short_ema > long_ema),
            }
        })
        .collect();

    Ok(SignalSeries::from_points(points))
}
