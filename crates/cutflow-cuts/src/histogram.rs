//! Cut-flow bin counters.

use cutflow_core::Variation;

/// Cumulative cut-flow counts for one (variation, cut flow) pair.
///
/// Bin 1 is `Initial`, followed by the standard cuts and the flow's own
/// cuts. Filling bin `n` counts the event in every bin up to `n`.
#[derive(Debug, Clone, PartialEq)]
pub struct CutFlowHistogram {
    flow: String,
    variation: Variation,
    labels: Vec<String>,
    counts: Vec<u64>,
    weights: Vec<f64>,
}

impl CutFlowHistogram {
    pub fn new(flow: impl Into<String>, variation: Variation, labels: Vec<String>) -> Self {
        let bins = labels.len();
        Self {
            flow: flow.into(),
            variation,
            labels,
            counts: vec![0; bins],
            weights: vec![0.0; bins],
        }
    }

    pub fn flow(&self) -> &str {
        &self.flow
    }

    pub fn variation(&self) -> &Variation {
        &self.variation
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Raw count of the bin labelled `label`.
    pub fn count(&self, label: &str) -> Option<u64> {
        self.labels
            .iter()
            .position(|l| l == label)
            .map(|i| self.counts[i])
    }

    /// Counts an event in bins `1..=bin`. Bins past the last label clamp.
    pub fn fill_bin(&mut self, bin: usize, weight: f64) {
        let last = bin.min(self.labels.len());
        for i in 0..last {
            self.counts[i] += 1;
            self.weights[i] += weight;
        }
    }

    /// Highest 1-based bin with a non-zero count.
    pub fn highest_filled(&self) -> usize {
        self.counts.iter().rposition(|&c| c > 0).map_or(0, |i| i + 1)
    }

    /// `(label, count, weighted sum)` rows in bin order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, u64, f64)> + '_ {
        self.labels
            .iter()
            .zip(&self.counts)
            .zip(&self.weights)
            .map(|((label, count), weight)| (label.as_str(), *count, *weight))
    }
}
