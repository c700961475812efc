//! Frequency-node quadrature
//!
//! Each node carries the width of the frequency band it stands for:
//!
//! ```text
//!   f0      f1        f2      f3
//!   |--dx0--|---dx1---|--dx2--|
//!   [dx0/2 ][(dx0+dx1)/2][(dx1+dx2)/2][dx2/2]
//! ```
//!
//! Summing `g(f_i)·w_i` is then the trapezoidal integral of `g`.

use super::aggregate::FrequencyNode;
use crate::types::{ProcessError, ProcessResult};
use tracing::warn;

/// Band widths of sorted, distinct frequencies
pub fn node_weights(frequencies: &[f64]) -> ProcessResult<Vec<f64>> {
    let n = frequencies.len();
    if n < 2 {
        return Err(ProcessError::InsufficientNodes { found: n });
    }

    let dx: Vec<f64> = frequencies.windows(2).map(|w| w[1] - w[0]).collect();
    let mut weights = Vec::with_capacity(n);
    weights.push(dx[0] / 2.0);
    for i in 1..n - 1 {
        weights.push((dx[i - 1] + dx[i]) / 2.0);
    }
    weights.push(dx[n - 2] / 2.0);
    Ok(weights)
}

/// Frequency nodes sorted ascending and unique by frequency, with weights
#[derive(Debug, Clone)]
pub struct FrequencyNodes {
    nodes: Vec<FrequencyNode>,
    weights: Vec<f64>,
}

impl FrequencyNodes {
    /// Sort and deduplicate; for repeated frequencies the last row wins
    pub fn new(mut nodes: Vec<FrequencyNode>) -> ProcessResult<Self> {
        if let Some(bad) = nodes.iter().find(|n| !n.frequency.is_finite()) {
            return Err(ProcessError::InvalidParameter(format!(
                "non-finite node frequency {}",
                bad.frequency
            )));
        }

        // Stable sort keeps input order among equal frequencies
        nodes.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));

        let mut unique: Vec<FrequencyNode> = Vec::with_capacity(nodes.len());
        for node in nodes {
            match unique.last_mut() {
                Some(last) if last.frequency == node.frequency => {
                    warn!("Duplicate frequency node {}: keeping the later row", node.frequency);
                    *last = node;
                }
                _ => unique.push(node),
            }
        }

        let frequencies: Vec<f64> = unique.iter().map(|n| n.frequency).collect();
        let weights = node_weights(&frequencies)?;
        Ok(Self {
            nodes: unique,
            weights,
        })
    }

    pub fn nodes(&self) -> &[FrequencyNode] {
        &self.nodes
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of amplitude channels (taken from the first node)
    pub fn channel_count(&self) -> usize {
        self.nodes.first().map_or(0, |n| n.amplitudes.len())
    }

    /// Node/weight pairs in frequency order
    pub fn iter(&self) -> impl Iterator<Item = (&FrequencyNode, f64)> {
        self.nodes.iter().zip(self.weights.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn node(frequency: f64, mean_response: f64) -> FrequencyNode {
        FrequencyNode {
            frequency,
            mean_response,
            amplitudes: vec![],
        }
    }

    #[test]
    fn test_uniform_weights() {
        let w = node_weights(&[0.3, 0.4, 0.5, 0.6]).unwrap();
        let expected = [0.05, 0.1, 0.1, 0.05];
        for (got, want) in w.iter().zip(expected) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert_relative_eq!(w.iter().sum::<f64>(), 0.3, epsilon = 1e-12);
    }

    #[test]
    fn test_uneven_weights() {
        let w = node_weights(&[0.0, 1.0, 3.0]).unwrap();
        assert_eq!(w, vec![0.5, 1.5, 1.0]);
    }

    #[test]
    fn test_single_node_rejected() {
        let err = node_weights(&[0.5]).unwrap_err();
        assert_eq!(err, ProcessError::InsufficientNodes { found: 1 });
    }

    #[test]
    fn test_nodes_sorted_and_deduplicated() {
        let nodes = FrequencyNodes::new(vec![
            node(0.5, 1.0),
            node(0.3, 2.0),
            node(0.5, 9.0),
            node(0.4, 3.0),
        ])
        .unwrap();

        let freqs: Vec<f64> = nodes.nodes().iter().map(|n| n.frequency).collect();
        assert_eq!(freqs, vec![0.3, 0.4, 0.5]);
        assert_eq!(nodes.nodes()[2].mean_response, 9.0);
        assert_eq!(nodes.weights().len(), 3);
    }

    #[test]
    fn test_duplicates_collapsing_to_one_node_fail() {
        let err = FrequencyNodes::new(vec![node(0.5, 1.0), node(0.5, 2.0)]).unwrap_err();
        assert_eq!(err, ProcessError::InsufficientNodes { found: 1 });
    }
}
