//! Score scaling wrapper

use crate::{EquivalenceGenerator, GeneratorError};
use async_trait::async_trait;
use equiv_domain::{Content, ScoredCandidates};

/// Multiplies every real score of an inner generator by a constant
///
/// Lets a weak signal in [0, 1] compete with generators that score on a
/// larger scale. `Unscored` stays `Unscored`.
pub struct ScalingGenerator {
    inner: Box<dyn EquivalenceGenerator>,
    factor: f64,
}

impl ScalingGenerator {
    /// Scale `inner` by `factor`
    pub fn new(inner: Box<dyn EquivalenceGenerator>, factor: f64) -> Self {
        Self { inner, factor }
    }
}

#[async_trait]
impl EquivalenceGenerator for ScalingGenerator {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, subject: &Content) -> Result<ScoredCandidates, GeneratorError> {
        let factor = self.factor;
        Ok(self
            .inner
            .generate(subject)
            .await?
            .map_scores(|candidate| candidate.score.map(|v| v * factor)))
    }
}
