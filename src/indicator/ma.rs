use std::num::NonZeroUsize;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;

/// Simple Moving Average over a trailing window.
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    period: NonZeroUsize,
}

impl Sma {
    pub fn new(period: usize) -> Result<Self, Report<IndicatorError>> {
        let Some(period) = NonZeroUsize::new(period) else {
            bail!(IndicatorError::InvalidParameter {
                name: "period must be > 0".into(),
            });
        };
        Ok(Self::from_nonzero(period))
    }

    pub const fn from_nonzero(period: NonZeroUsize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period.get()
    }
}

impl Indicator for Sma {
    fn name(&self) -> String {
        format!("MA{}", self.period)
    }

    fn required_closes(&self) -> usize {
        self.period()
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let period = self.period();
        let mut values = Vec::with_capacity(closes.len());
        let mut sum = 0.0;
        for (i, &close) in closes.iter().enumerate() {
            sum += close;
            if i >= period {
                sum -= closes[i - period];
            }
            values.push((i + 1 >= period).then(|| sum / period as f64));
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sma_period_zero_invalid() {
        assert!(Sma::new(0).is_err());
    }

    #[test]
    fn sma_short_input_is_all_none() {
        let sma = Sma::new(5).unwrap();
        let values = sma.calculate(&[1.0; 4]);
        assert_eq!(values, vec![None; 4]);
    }

    #[test]
    fn sma_empty_input() {
        let sma = Sma::new(3).unwrap();
        assert!(sma.calculate(&[]).is_empty());
    }

    #[test]
    fn sma_flat_prices() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&[10.0; 5]);
        assert_eq!(values.len(), 5);
        for v in values.iter().skip(2) {
            assert!((v.unwrap() - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn sma_known_value() {
        let sma = Sma::new(3).unwrap();
        let values = sma.calculate(&[1.0, 2.0, 3.0, 4.0]);
        // (1+2+3)/3 = 2.0, (2+3+4)/3 = 3.0
        assert_eq!(values, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn sma_period_one_is_identity() {
        let sma = Sma::new(1).unwrap();
        assert_eq!(sma.calculate(&[4.0, 5.0]), vec![Some(4.0), Some(5.0)]);
    }

    #[test]
    fn sma_matches_window_mean_on_long_series() {
        let closes: Vec<f64> = (0..500).map(|i| 100.0 + (i as f64 * 0.37).sin() * 5.0).collect();
        let sma = Sma::new(20).unwrap();
        let values = sma.calculate(&closes);
        for (i, w) in closes.windows(20).enumerate() {
            let expected = w.iter().sum::<f64>() / 20.0;
            assert!((values[i + 19].unwrap() - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn sma_name_and_requirement() {
        let sma = Sma::new(20).unwrap();
        assert_eq!(sma.name(), "MA20");
        assert_eq!(sma.required_closes(), 20);
    }
}
