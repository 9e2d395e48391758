use crate::errors::{SimError, SimResult};
use crate::models::OptionPricer;
use crate::state::{OptionQuote, PricingParameters};
use statrs::distribution::{ContinuousCDF, Normal};

/// Black-Scholes pricing for a non-dividend-paying European option.
///
/// d1 = (ln(S/K) + (r + sigma^2/2)*T) / (sigma * sqrt(T))
/// d2 = d1 - sigma * sqrt(T)
/// C  = S*N(d1) - K*e^(-rT)*N(d2)
/// P  = K*e^(-rT)*N(-d2) - S*N(-d1)
///
/// All computation uses precomputed PricingParameters. No allocations.
#[derive(Debug, Clone)]
pub struct BlackScholes {
    /// Standard normal distribution (created once, reused)
    normal: Normal,
}

impl BlackScholes {
    pub fn new() -> Self {
        Self {
            normal: Normal::standard(),
        }
    }

    /// Returns (d1, d2).
    #[inline]
    pub fn d1_d2(params: &PricingParameters) -> (f64, f64) {
        let d1 = (params.ln_s_k()
            + (params.risk_free_rate() + params.half_sigma_sq()) * params.time_to_expiry())
            / params.sigma_sqrt_t();
        (d1, d1 - params.sigma_sqrt_t())
    }
}

impl Default for BlackScholes {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionPricer for BlackScholes {
    #[inline]
    fn name(&self) -> &'static str {
        "Black-Scholes"
    }

    fn price(&self, params: &PricingParameters) -> SimResult<OptionQuote> {
        let (d1, d2) = Self::d1_d2(params);
        let spot = params.spot();
        let pv_strike = params.strike() * params.discount();

        let call = spot * self.normal.cdf(d1) - pv_strike * self.normal.cdf(d2);
        let put = pv_strike * self.normal.cdf(-d2) - spot * self.normal.cdf(-d1);

        if !call.is_finite() || !put.is_finite() {
            return Err(SimError::InvalidParameter(format!(
                "non-finite price for spot={spot} strike={}",
                params.strike()
            )));
        }

        Ok(OptionQuote { call, put })
    }
}
