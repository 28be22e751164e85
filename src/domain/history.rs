// Bounded location history
use super::location::PositionSample;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Number of samples kept.
pub const HISTORY_CAPACITY: usize = 10;

/// Most-recent-first sequence of samples, never longer than [`HISTORY_CAPACITY`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PositionSample>", into = "Vec<PositionSample>")]
pub struct LocationHistory {
    samples: VecDeque<PositionSample>,
}

impl LocationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts at the front and evicts from the tail once over capacity.
    pub fn record(&mut self, sample: PositionSample) {
        self.samples.push_front(sample);
        self.samples.truncate(HISTORY_CAPACITY);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PositionSample> + '_ {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&PositionSample> {
        self.samples.front()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PositionSample> {
        self.samples.iter().cloned().collect()
    }
}

impl From<Vec<PositionSample>> for LocationHistory {
    fn from(samples: Vec<PositionSample>) -> Self {
        let mut samples: VecDeque<_> = samples.into();
        samples.truncate(HISTORY_CAPACITY);
        Self { samples }
    }
}

impl From<LocationHistory> for Vec<PositionSample> {
    fn from(history: LocationHistory) -> Self {
        history.samples.into()
    }
}
