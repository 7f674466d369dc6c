use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::LossError;

/// Política de reducción de la pérdida
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// 0 - un-reduced weighted losses, shaped like labels with the axis collapsed
    None,
    /// 1 - sum of all weighted losses
    WeightedSum,
    /// 2 - weighted sum divided by the sum of the weights
    WeightedMean,
    /// 3 - weighted sum divided by the number of non-zero weights
    #[default]
    WeightedSumByNonZeroWeights,
}

impl Reduction {
    pub const ALL: [Reduction; 4] = [
        Reduction::None,
        Reduction::WeightedSum,
        Reduction::WeightedMean,
        Reduction::WeightedSumByNonZeroWeights,
    ];

    /// Integer code used by the operator's argument list
    pub fn code(self) -> i64 {
        match self {
            Reduction::None => 0,
            Reduction::WeightedSum => 1,
            Reduction::WeightedMean => 2,
            Reduction::WeightedSumByNonZeroWeights => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Reduction::None => "none",
            Reduction::WeightedSum => "weighted_sum",
            Reduction::WeightedMean => "weighted_mean",
            Reduction::WeightedSumByNonZeroWeights => "weighted_sum_by_nonzero_weights",
        }
    }

    /// Every mode except `None` produces a scalar
    pub fn is_scalar_output(self) -> bool {
        !matches!(self, Reduction::None)
    }
}

impl TryFrom<i64> for Reduction {
    type Error = LossError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Reduction::None),
            1 => Ok(Reduction::WeightedSum),
            2 => Ok(Reduction::WeightedMean),
            3 => Ok(Reduction::WeightedSumByNonZeroWeights),
            other => Err(LossError::InvalidReductionMode(other)),
        }
    }
}

impl FromStr for Reduction {
    type Err = String;

    /// Accepts either the integer code or the snake_case name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<i64>() {
            return Reduction::try_from(code).map_err(|e| e.to_string());
        }
        Reduction::ALL
            .into_iter()
            .find(|r| r.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown reduction '{}', expected 0-3 or one of: none, weighted_sum, weighted_mean, weighted_sum_by_nonzero_weights",
                    s
                )
            })
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
