//! Named corrections for known defects in individual entities' source series.
//!
//! Corrections are keyed by entity in the layout, so adding one for another entity is a
//! configuration change rather than a code change.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionPolicy {
    /// Carry the last present value forward over each gap.
    ForwardFill,
}

impl CorrectionPolicy {
    /// Applies the correction in place, returning how many cells were changed.
    pub fn apply(&self, series: &mut [Option<f64>]) -> usize {
        match self {
            CorrectionPolicy::ForwardFill => forward_fill(series),
        }
    }
}

/// Leading gaps have nothing to carry forward and stay missing.
pub fn forward_fill(series: &mut [Option<f64>]) -> usize {
    let mut last_seen = None;
    let mut filled = 0;
    for cell in series.iter_mut() {
        match *cell {
            Some(value) => last_seen = Some(value),
            None => {
                if let Some(value) = last_seen {
                    *cell = Some(value);
                    filled += 1;
                }
            }
        }
    }
    filled
}
