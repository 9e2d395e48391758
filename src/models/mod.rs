pub mod black_scholes;
pub mod sweep;

use crate::errors::SimResult;
use crate::state::{OptionQuote, PricingParameters};

/// European option pricers implement this trait.
/// price() must be a pure function: deterministic output from inputs only.
/// Send + Sync required so sweeps can fan out across the rayon pool.
pub trait OptionPricer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Theoretical call and put prices for one set of parameters.
    fn price(&self, params: &PricingParameters) -> SimResult<OptionQuote>;
}
