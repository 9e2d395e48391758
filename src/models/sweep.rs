use crate::errors::{SimError, SimResult};
use crate::models::OptionPricer;
use crate::state::{MarketParams, StrikeQuote, StrikeSweepResult};
use rayon::prelude::*;

/// Default strike offsets: -30% .. +30% of spot in 10% steps (ATM included).
pub fn default_offsets() -> Vec<f64> {
    (-3..=3).map(|i| i as f64 / 10.0).collect()
}

/// Price one option per offset, with strike = spot * (1 + offset).
///
/// Offsets must be finite and strictly ascending, so strikes come out
/// strictly ascending. Strikes are evaluated in parallel; the indexed
/// collect keeps input order. The lowest failing strike aborts the whole
/// sweep, whichever thread finished first.
pub fn sweep(
    pricer: &dyn OptionPricer,
    spot: f64,
    base: &MarketParams,
    offsets: &[f64],
) -> SimResult<StrikeSweepResult> {
    if !spot.is_finite() || spot <= 0.0 {
        return Err(SimError::InvalidParameter(format!("spot must be > 0, got {spot}")));
    }
    if let Some(bad) = offsets.iter().find(|o| !o.is_finite()) {
        return Err(SimError::InvalidParameter(format!("offset must be finite, got {bad}")));
    }
    if let Some(w) = offsets.windows(2).find(|w| w[1] <= w[0]) {
        return Err(SimError::InvalidParameter(format!(
            "offsets must be strictly ascending ({} then {})",
            w[0], w[1]
        )));
    }

    let rows = offsets
        .par_iter()
        .map(|&offset| {
            let strike = spot * (1.0 + offset);
            let params = base.with_strike(spot, strike).map_err(|e| match e {
                SimError::InvalidParameter(msg) => {
                    SimError::InvalidParameter(format!("strike {strike} (offset {offset}): {msg}"))
                }
                other => other,
            })?;
            let quote = pricer.price(&params)?;
            Ok(StrikeQuote {
                strike,
                call: quote.call,
                put: quote.put,
            })
        })
        .collect::<Vec<SimResult<StrikeQuote>>>()
        .into_iter()
        .collect::<SimResult<Vec<_>>>()?;

    let result = StrikeSweepResult::from_rows(rows);
    tracing::debug!(
        model = pricer.name(),
        spot = spot,
        strikes = result.len(),
        "strike sweep complete"
    );

    Ok(result)
}
