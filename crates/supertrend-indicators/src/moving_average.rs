//! Moving average indicators.

use supertrend_core::traits::Indicator;

/// Simple Moving Average (SMA).
///
/// Calculates the arithmetic mean of the last N values.
#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
}

impl Sma {
    /// Create a new SMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        if data.len() < self.period {
            return vec![];
        }

        let period_f64 = self.period as f64;
        let mut result = Vec::with_capacity(data.len() - self.period + 1);

        let mut sum: f64 = data[..self.period].iter().sum();
        result.push(sum / period_f64);

        for i in self.period..data.len() {
            sum = sum - data[i - self.period] + data[i];
            result.push(sum / period_f64);
        }

        result
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "SMA"
    }
}

/// Exponentially smoothed average seeded with the SMA of the first
/// `period` values: `avg = value * alpha + prev * (1 - alpha)`.
fn smooth(data: &[f64], period: usize, alpha: f64) -> Vec<f64> {
    if data.len() < period {
        return vec![];
    }

    let mut result = Vec::with_capacity(data.len() - period + 1);

    let mut avg: f64 = data[..period].iter().sum::<f64>() / period as f64;
    result.push(avg);

    let one_minus_alpha = 1.0 - alpha;
    for &value in &data[period..] {
        avg = value * alpha + avg * one_minus_alpha;
        result.push(avg);
    }

    result
}

/// Exponential Moving Average (EMA), `alpha = 2 / (period + 1)`.
#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    multiplier: f64,
}

impl Ema {
    /// Create a new EMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        let multiplier = 2.0 / (period as f64 + 1.0);
        Self { period, multiplier }
    }
}

impl Indicator for Ema {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        smooth(data, self.period, self.multiplier)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "EMA"
    }
}

/// Wilder's running moving average (RMA), `alpha = 1 / period`.
///
/// Used by RSI and ATR.
#[derive(Debug, Clone)]
pub struct Rma {
    period: usize,
}

impl Rma {
    /// Create a new RMA with the specified period.
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }
}

impl Indicator for Rma {
    type Output = f64;

    fn calculate(&self, data: &[f64]) -> Vec<f64> {
        smooth(data, self.period, 1.0 / self.period as f64)
    }

    fn period(&self) -> usize {
        self.period
    }

    fn name(&self) -> &str {
        "RMA"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma() {
        let sma = Sma::new(3);
        let result = sma.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_sma_insufficient_data() {
        assert!(Sma::new(5).calculate(&[1.0, 2.0, 3.0]).is_empty());
    }

    #[test]
    fn test_ema() {
        let ema = Ema::new(3);
        let result = ema.calculate(&[1.0, 2.0, 3.0, 4.0, 5.0]);

        assert_eq!(result.len(), 3);
        // Seed is the SMA of the first three, then alpha = 0.5
        assert!((result[0] - 2.0).abs() < 1e-10);
        assert!((result[1] - 3.0).abs() < 1e-10);
        assert!((result[2] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_rma() {
        let rma = Rma::new(2);
        let result = rma.calculate(&[2.0, 4.0, 6.0]);

        // Seed 3.0, then 6 * 0.5 + 3 * 0.5
        assert_eq!(result, vec![3.0, 4.5]);
    }

    #[test]
    fn test_period_one_is_identity() {
        let data = [5.0, 7.0, 6.0];
        assert_eq!(Sma::new(1).calculate(&data), data.to_vec());
        assert_eq!(Rma::new(1).calculate(&data), data.to_vec());
    }
}
