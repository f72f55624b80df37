//! Size and variance thresholds for the decision walk (`[thresholds]` table).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    /// Nodes shorter than this are ignored along with their subtree
    #[serde(default = "default_min_len")]
    pub min_len: usize,
    /// Nodes shorter than this are classified as one unit
    #[serde(default = "default_unit_max_len")]
    pub unit_max_len: usize,
    /// Childless nodes longer than this are never sent for classification
    #[serde(default = "default_leaf_max_len")]
    pub leaf_max_len: usize,
    /// Child-length population variance below which children are visited individually
    #[serde(default = "default_variance_max")]
    pub variance_max: f64,
}

fn default_min_len() -> usize {
    5
}

fn default_unit_max_len() -> usize {
    500
}

fn default_leaf_max_len() -> usize {
    3500
}

fn default_variance_max() -> f64 {
    500.0
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            min_len: default_min_len(),
            unit_max_len: default_unit_max_len(),
            leaf_max_len: default_leaf_max_len(),
            variance_max: default_variance_max(),
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<(), String> {
        if self.min_len > self.unit_max_len {
            return Err(format!(
                "min_len ({}) must not exceed unit_max_len ({})",
                self.min_len, self.unit_max_len
            ));
        }
        if self.unit_max_len > self.leaf_max_len {
            return Err(format!(
                "unit_max_len ({}) must not exceed leaf_max_len ({})",
                self.unit_max_len, self.leaf_max_len
            ));
        }
        if !self.variance_max.is_finite() || self.variance_max < 0.0 {
            return Err(format!(
                "variance_max must be a non-negative number (got {})",
                self.variance_max
            ));
        }
        Ok(())
    }
}
