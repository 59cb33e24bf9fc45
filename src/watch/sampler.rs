//! Trend sampling window and the sell/hold policy

use super::types::{Decision, DecisionAction, Sample};
use rust_decimal::Decimal;

/// Sell iff the window's maximum failed to reach `start * (1 + hold_margin)`
pub fn decide(start_price: Decimal, max_price: Decimal, hold_margin: Decimal) -> DecisionAction {
    if max_price < start_price * (Decimal::ONE + hold_margin) {
        DecisionAction::Sell
    } else {
        DecisionAction::Hold
    }
}

/// Fixed-count sampler started at a crossing.
///
/// Each call to [`record`](Self::record) is one tick of the sampler's own
/// clock. When no fresh price is available the previous value is reused.
#[derive(Debug, Clone)]
pub struct TrendSampler {
    start_price: Decimal,
    target_count: usize,
    samples: Vec<Sample>,
    max_price: Option<Decimal>,
    last_price: Decimal,
}

impl TrendSampler {
    pub fn new(start_price: Decimal, sample_count: usize) -> Self {
        Self {
            start_price,
            target_count: sample_count.max(1),
            samples: Vec::with_capacity(sample_count),
            max_price: None,
            last_price: start_price,
        }
    }

    pub fn start_price(&self) -> Decimal {
        self.start_price
    }

    /// Take one sample. Returns `true` once the window is full; further
    /// calls after that are ignored.
    pub fn record(&mut self, latest: Option<Decimal>) -> bool {
        if self.is_complete() {
            return true;
        }

        let price = latest.unwrap_or(self.last_price);
        self.last_price = price;
        self.max_price = Some(self.max_price.map_or(price, |max| max.max(price)));
        self.samples.push(Sample {
            tick_index: self.samples.len() + 1,
            price,
        });

        tracing::debug!(
            sample = self.samples.len(),
            of = self.target_count,
            %price,
            max = ?self.max_price,
            "Trend sample"
        );

        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.target_count
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Running maximum; the start price until the first sample lands
    pub fn max_price(&self) -> Decimal {
        self.max_price.unwrap_or(self.start_price)
    }

    /// Apply the policy to the completed window
    pub fn finish(self, hold_margin: Decimal) -> Decision {
        let reference_max = self.max_price();
        Decision {
            action: decide(self.start_price, reference_max, hold_margin),
            reference_max,
            start_price: self.start_price,
            samples: self.samples,
        }
    }
}
