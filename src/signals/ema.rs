/// Recursive exponential moving average.
///
/// alpha = 2 / (window + 1)
/// ema_0 = first price
/// ema_t = alpha * price_t + (1 - alpha) * ema_{t-1}
///
/// Seeded by the first observation, so a value exists from the first point
/// on; no warm-up window is dropped. All updates are in-place.
#[derive(Debug, Clone, Copy)]
pub struct Ema {
    alpha: f64,
    value: Option<f64>,
}

impl Ema {
    /// `window` must be >= 1; callers validate before constructing.
    pub fn new(window: usize) -> Self {
        Self {
            alpha: 2.0 / (window as f64 + 1.0),
            value: None,
        }
    }

    /// Feed one price, return the updated average.
    #[inline]
    pub fn update(&mut self, price: f64) -> f64 {
        let next = match self.value {
            None => price,
            Some(prev) => self.alpha * price + (1.0 - self.alpha) * prev,
        };
        self.value = Some(next);
        next
    }
}
