use std::fmt;
use std::str::FromStr;

use super::recognition_error::RecognitionError;

/// Which way a recognizer's score points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScorePolarity {
    /// Lower is a better match (a distance).
    Distance,
    /// Higher is a better match (a likelihood or similarity).
    Similarity,
}

impl ScorePolarity {
    /// Whether a prediction with `score` must be reported as unknown.
    ///
    /// Distances at or above the threshold are rejected, which is the
    /// decision rule of the reference recognizers. Similarities at or
    /// below it are rejected.
    pub fn rejects(self, score: f64, threshold: f64) -> bool {
        match self {
            ScorePolarity::Distance => score >= threshold,
            ScorePolarity::Similarity => score <= threshold,
        }
    }

    /// Threshold that accepts every finite score.
    pub fn permissive_threshold(self) -> f64 {
        match self {
            ScorePolarity::Distance => f64::INFINITY,
            ScorePolarity::Similarity => f64::NEG_INFINITY,
        }
    }
}

/// The recognizer families the crate can train.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    Eigen,
    Fisher,
    Lbph,
}

impl AlgorithmKind {
    pub const ALL: [AlgorithmKind; 3] = [AlgorithmKind::Eigen, AlgorithmKind::Fisher, AlgorithmKind::Lbph];

    pub fn name(self) -> &'static str {
        match self {
            AlgorithmKind::Eigen => "Eigen",
            AlgorithmKind::Fisher => "Fisher",
            AlgorithmKind::Lbph => "LBPH",
        }
    }

    pub fn polarity(self) -> ScorePolarity {
        match self {
            AlgorithmKind::Eigen | AlgorithmKind::Fisher | AlgorithmKind::Lbph => {
                ScorePolarity::Distance
            }
        }
    }

    /// Minimum number of distinct labels the training set must contain.
    pub fn min_distinct_labels(self) -> usize {
        match self {
            AlgorithmKind::Fisher => 2,
            AlgorithmKind::Eigen | AlgorithmKind::Lbph => 1,
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            AlgorithmKind::Eigen => 1,
            AlgorithmKind::Fisher => 2,
            AlgorithmKind::Lbph => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        AlgorithmKind::ALL.into_iter().find(|kind| kind.tag() == tag)
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AlgorithmKind {
    type Err = RecognitionError;

    /// Accepts the canonical names case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlgorithmKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RecognitionError::InvalidAlgorithm(s.to_string()))
    }
}
