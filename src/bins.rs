//! Age binning.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Label assigned to every record when the source carries no age column at all.
pub const UNKNOWN_AGE_GROUP: &str = "unknown";

const DEFAULT_UPPER_BOUNDS: [u32; 8] = [9, 19, 29, 39, 49, 59, 69, 79];

/// Ordered, labeled age intervals.
///
/// `upper_bounds[i]` closes bin `i`; the bin after the last bound is open
/// ended, so there is always one more label than bound. Each bin excludes its
/// lower bound except the first, which starts at 0 inclusive. Ages are
/// truncated to whole years before lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBins {
    pub upper_bounds: Vec<u32>,
    pub labels: Vec<String>,
}

impl Default for AgeBins {
    fn default() -> Self {
        let mut labels = Vec::with_capacity(DEFAULT_UPPER_BOUNDS.len() + 1);
        let mut lower = 0;
        for upper in DEFAULT_UPPER_BOUNDS {
            labels.push(format!("{lower}-{upper}"));
            lower = upper + 1;
        }
        labels.push(format!("{lower}+"));
        Self {
            upper_bounds: DEFAULT_UPPER_BOUNDS.to_vec(),
            labels,
        }
    }
}

impl AgeBins {
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.labels.len() != self.upper_bounds.len() + 1 {
            return Err(PipelineError::InvalidBins(format!(
                "{} label(s) for {} upper bound(s); expected exactly one more label than bounds",
                self.labels.len(),
                self.upper_bounds.len()
            )));
        }
        if let Some(pair) = self.upper_bounds.windows(2).find(|w| w[0] >= w[1]) {
            return Err(PipelineError::InvalidBins(format!(
                "upper bounds must be strictly increasing ({} then {})",
                pair[0], pair[1]
            )));
        }
        if let Some(label) = self.labels.iter().find(|l| l.trim().is_empty()) {
            return Err(PipelineError::InvalidBins(format!(
                "empty bin label {label:?}"
            )));
        }
        Ok(())
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Bin label for `age`, or `None` for negative or non-finite ages.
    pub fn label_for(&self, age: f64) -> Option<&str> {
        if !age.is_finite() || age < 0.0 {
            return None;
        }
        let years = age.trunc();
        let idx = self
            .upper_bounds
            .iter()
            .position(|upper| years <= f64::from(*upper))
            .unwrap_or(self.upper_bounds.len());
        self.labels.get(idx).map(String::as_str)
    }
}
