use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SequenceError {
    #[error("Node count must be finite and at least 2, got {0}")]
    NodeCount(f64),
    #[error("Break point {break_point} must satisfy 2 <= i0 < {nodes}")]
    BreakPoint { break_point: f64, nodes: usize },
}

/// Linear-parabolic node sequence: quadratic near `r_min`, linear towards `r_max`.
/// Nodes are addressed 1-based, `position(1) == r_min` and `position(nodes) == r_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearParabolic {
    nodes: usize,
    break_point: usize,
    r_min: f64,
    // position of the node at the break point
    r0: f64,
    a: f64,
    b: f64,
}

impl LinearParabolic {
    pub fn new(
        nodes: usize,
        break_point: usize,
        r_min: f64,
        r_max: f64,
    ) -> Result<Self, SequenceError> {
        if nodes < 2 {
            return Err(SequenceError::NodeCount(nodes as f64));
        }
        if break_point < 2 || break_point >= nodes {
            return Err(SequenceError::BreakPoint {
                break_point: break_point as f64,
                nodes,
            });
        }

        let (n, i0) = (nodes as f64, break_point as f64);
        let r0 = (r_max * (i0 - 1.0) + r_min * (n - i0)) / (2.0 * n - i0 - 1.0);
        let a = (r0 - r_min) / (i0 - 1.0) / (i0 - 1.0);
        let b = (r_max - r0) / (n - i0);

        Ok(Self {
            nodes,
            break_point,
            r_min,
            r0,
            a,
            b,
        })
    }

    /// Build the sequence from an estimate, rounding the node count up
    pub fn from_estimate(
        nodes: f64,
        break_point: f64,
        r_min: f64,
        r_max: f64,
    ) -> Result<Self, SequenceError> {
        let rounded = nodes.ceil();
        if !rounded.is_finite() || rounded < 2.0 {
            return Err(SequenceError::NodeCount(nodes));
        }
        let nodes = rounded as usize;

        if !break_point.is_finite() || break_point < 2.0 || break_point >= rounded {
            return Err(SequenceError::BreakPoint { break_point, nodes });
        }

        Self::new(nodes, break_point as usize, r_min, r_max)
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }

    pub fn break_point(&self) -> usize {
        self.break_point
    }

    /// position of node `i`, 1-based
    pub fn position(&self, i: usize) -> f64 {
        if i < self.break_point {
            let offset = (i as f64) - 1.0;
            self.r_min + self.a * offset * offset
        } else {
            self.r0 + self.b * (i - self.break_point) as f64
        }
    }

    pub fn positions(&self) -> Vec<f64> {
        (1..=self.nodes).map(|i| self.position(i)).collect()
    }

    /// largest distance between two neighbouring nodes
    pub fn max_spacing(&self) -> f64 {
        self.positions()
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold(0.0, f64::max)
    }
}
