use std::num::NonZeroUsize;

use error_stack::{Report, bail};

use crate::error::IndicatorError;
use crate::indicator::Indicator;

/// RSI (Relative Strength Index) using a simple trailing mean of gains and losses.
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    period: NonZeroUsize,
}

impl Rsi {
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

impl Indicator for Rsi {
    fn name(&self) -> String {
        format!("RSI{}", self.period)
    }

    fn required_closes(&self) -> usize {
        self.period() + 1
    }

    fn calculate(&self, closes: &[f64]) -> Vec<Option<f64>> {
        let period = self.period();
        let mut values = vec![None; closes.len().min(period)];
        if closes.len() <= period {
            return values;
        }

        let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();

        // deltas[k] is the change into close k + 1, so a window ending at
        // delta k belongs to close index k + 1.
        values.extend(deltas.windows(period).map(|w| {
            let gain = w.iter().map(|&d| d.max(0.0)).sum::<f64>() / period as f64;
            let loss = w.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / period as f64;
            rsi_value(gain, loss)
        }));

        values
    }
}

/// RSI from average gain and loss, with the zero-loss cases handled explicitly:
/// gains with no losses saturate at 100, a flat window is undefined.
pub fn rsi_value(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 {
        return (avg_gain > 0.0).then_some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};

    #[test]
    fn rsi_period_zero_invalid() {
        assert!(Rsi::new(0).is_err());
    }

    #[test]
    fn rsi_insufficient_data_is_all_none() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&[1.0; 10]);
        assert_eq!(values, vec![None; 10]);
        assert_eq!(rsi.calculate(&[1.0; 14]), vec![None; 14]);
    }

    #[test]
    fn rsi_output_length_matches_input() {
        let rsi = Rsi::new(14).unwrap();
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let values = rsi.calculate(&closes);
        assert_eq!(values.len(), 20);
        assert!(values[13].is_none());
        assert!(values[14].is_some());
    }

    #[test]
    fn rsi_non_decreasing_saturates_to_100() {
        let rsi = Rsi::new(14).unwrap();
        // 15 closes, flat with a single rise: avg_loss = 0, avg_gain > 0
        let mut closes = vec![10.0; 14];
        closes.push(11.0);
        let values = rsi.calculate(&closes);
        assert_eq!(values[14], Some(100.0));
    }

    #[test]
    fn rsi_constant_series_is_undefined() {
        let rsi = Rsi::new(14).unwrap();
        let values = rsi.calculate(&[42.0; 30]);
        assert!(values.iter().all(Option::is_none));
    }

    #[test]
    fn rsi_all_losses_returns_0() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(values[3], Some(0.0));
    }

    #[test]
    fn rsi_known_value() {
        let rsi = Rsi::new(2).unwrap();
        // deltas +2, -1 -> avg_gain 1.0, avg_loss 0.5, rs 2 -> 66.67
        let values = rsi.calculate(&[10.0, 12.0, 11.0]);
        let v = values[2].unwrap();
        assert!((v - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn rsi_flat_after_movement_becomes_undefined() {
        let rsi = Rsi::new(3).unwrap();
        let values = rsi.calculate(&[1.0, 2.0, 2.0, 2.0, 2.0, 2.0]);
        assert_eq!(values[3], Some(100.0));
        assert_eq!(values[4], None);
        assert_eq!(values[5], None);
    }

    #[test]
    fn rsi_stays_in_range_for_random_walks() {
        let rsi = Rsi::new(14).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut price = 100.0_f64;
            let closes: Vec<f64> = (0..120)
                .map(|_| {
                    price = (price + rng.random_range(-3.0..3.0)).max(0.01);
                    price
                })
                .collect();
            for v in rsi.calculate(&closes).into_iter().flatten() {
                assert!((0.0..=100.0).contains(&v), "rsi out of range: {v}");
            }
        }
    }

    #[test]
    fn rsi_value_guards_division() {
        assert_eq!(rsi_value(1.0, 0.0), Some(100.0));
        assert_eq!(rsi_value(0.0, 0.0), None);
        assert_eq!(rsi_value(1.0, 1.0), Some(50.0));
    }
}
