//! Score module
//!
//! Every generator, scorer and combiner speaks in [`Score`]. The two variants
//! carry three meanings: `Unscored` is the absence of an opinion, a positive
//! `Real` is evidence for equivalence, and a negative `Real` is deliberate
//! evidence against it. `Unscored` must never be read as zero.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A component's opinion about one candidate
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Score {
    /// No opinion; contributes nothing to combination
    #[default]
    Unscored,
    /// A real score, possibly negative
    Real(f64),
}

impl Score {
    /// Real zero
    pub const ZERO: Score = Score::Real(0.0);

    /// Real one
    pub const ONE: Score = Score::Real(1.0);

    /// Real minus one
    pub const NEGATIVE_ONE: Score = Score::Real(-1.0);

    /// Whether this carries a value
    pub fn is_real(&self) -> bool {
        matches!(self, Score::Real(_))
    }

    /// The value, if real
    pub fn value(&self) -> Option<f64> {
        match self {
            Score::Real(v) => Some(*v),
            Score::Unscored => None,
        }
    }

    /// Sum two scores; `Unscored` is the identity
    ///
    /// # Examples
    ///
    /// ```
    /// use equiv_domain::Score;
    ///
    /// assert_eq!(Score::Real(2.0).add(Score::Unscored), Score::Real(2.0));
    /// assert_eq!(Score::Unscored.add(Score::Unscored), Score::Unscored);
    /// assert_eq!(Score::Real(2.0).add(Score::NEGATIVE_ONE), Score::Real(1.0));
    /// ```
    pub fn add(self, other: Score) -> Score {
        match (self, other) {
            (Score::Real(a), Score::Real(b)) => Score::Real(a + b),
            (Score::Real(a), Score::Unscored) | (Score::Unscored, Score::Real(a)) => Score::Real(a),
            (Score::Unscored, Score::Unscored) => Score::Unscored,
        }
    }

    /// Apply `f` to a real value; `Unscored` stays `Unscored`
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Score {
        match self {
            Score::Real(v) => Score::Real(f(v)),
            Score::Unscored => Score::Unscored,
        }
    }

    /// Whether the score is real and strictly positive
    pub fn is_positive(&self) -> bool {
        matches!(self, Score::Real(v) if *v > 0.0)
    }

    /// Ranking order: real scores by value, `Unscored` below every real score
    pub fn rank_cmp(&self, other: &Score) -> Ordering {
        match (self, other) {
            (Score::Real(a), Score::Real(b)) => a.total_cmp(b),
            (Score::Real(_), Score::Unscored) => Ordering::Greater,
            (Score::Unscored, Score::Real(_)) => Ordering::Less,
            (Score::Unscored, Score::Unscored) => Ordering::Equal,
        }
    }
}

impl From<f64> for Score {
    fn from(value: f64) -> Self {
        Score::Real(value)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Real(v) => write!(f, "{:.3}", v),
            Score::Unscored => f.write_str("none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unscored_is_not_zero() {
        assert_ne!(Score::Unscored, Score::ZERO);
        assert!(!Score::Unscored.is_real());
        assert_eq!(Score::Unscored.value(), None);
    }

    #[test]
    fn test_negative_scores_are_real() {
        assert!(Score::NEGATIVE_ONE.is_real());
        assert!(!Score::NEGATIVE_ONE.is_positive());
        assert_eq!(Score::NEGATIVE_ONE.value(), Some(-1.0));
    }

    #[test]
    fn test_map_skips_unscored() {
        assert_eq!(Score::Real(3.0).map(|v| v / 3.0), Score::ONE);
        assert_eq!(Score::Unscored.map(|v| v + 1.0), Score::Unscored);
    }

    #[test]
    fn test_rank_order_puts_unscored_last() {
        let mut scores = vec![
            Score::Unscored,
            Score::Real(-1.0),
            Score::Real(2.0),
            Score::Real(0.5),
        ];
        scores.sort_by(|a, b| b.rank_cmp(a));
        assert_eq!(
            scores,
            vec![
                Score::Real(2.0),
                Score::Real(0.5),
                Score::Real(-1.0),
                Score::Unscored
            ]
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Score::Real(2.0).to_string(), "2.000");
        assert_eq!(Score::Unscored.to_string(), "none");
    }
}
