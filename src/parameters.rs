use crate::error::{Error, Result};
use crate::{Fecundity, GenerationId, GenerationType};
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Parameters {
    /// Number of generations to simulate after the founders' generation 0.
    pub generations: GenerationId,
    /// Competition factor of generation 0.
    pub seed_competition: f64,
    /// Exponent δ of the damping transform of the competition factor.
    pub competition_delta: f64,
    /// A competition factor above this makes a DECLINE generation.
    pub decline_threshold: f64,
    /// A competition factor below this makes a GROWTH generation.
    pub growth_threshold: f64,

    pub decline_fecundity: Fecundity,
    pub stable_fecundity: Fecundity,
    pub growth_fecundity: Fecundity,
}

impl Default for Parameters {
    fn default() -> Parameters {
        Parameters {
            generations: 10,
            seed_competition: 0.2,
            competition_delta: 1.5,
            decline_threshold: 0.6,
            growth_threshold: 0.2,

            decline_fecundity: Fecundity::new(1),
            stable_fecundity: Fecundity::new(2),
            growth_fecundity: Fecundity::new(4),
        }
    }
}

impl Parameters {
    /// The rate of the offspring process for couples formed in a generation
    /// of the given type.
    pub fn fecundity(&self, kind: GenerationType) -> Fecundity {
        match kind {
            GenerationType::Decline => self.decline_fecundity,
            GenerationType::Stable => self.stable_fecundity,
            GenerationType::Growth => self.growth_fecundity,
        }
    }

    /**
    The damping transform only keeps the competition factor inside (0, 1) for
    a positive δ and a seed in (0, 1), and the classification band needs
    `growth_threshold < decline_threshold`.

    ```rust
    let mut p = model::Parameters::default();
    assert!(p.validate().is_ok());
    p.growth_threshold = 0.7;
    assert!(p.validate().is_err());
    ```
     */
    pub fn validate(&self) -> Result<()> {
        if !(self.competition_delta > 0.) {
            return Err(Error::InvalidParameter(format!(
                "competition delta must be positive, not {}",
                self.competition_delta
            )));
        }
        if !(0. < self.seed_competition && self.seed_competition < 1.) {
            return Err(Error::InvalidParameter(format!(
                "seed competition must lie in (0, 1), not {}",
                self.seed_competition
            )));
        }
        if !(0. < self.growth_threshold
            && self.growth_threshold < self.decline_threshold
            && self.decline_threshold < 1.)
        {
            return Err(Error::InvalidParameter(format!(
                "thresholds must satisfy 0 < growth ({}) < decline ({}) < 1",
                self.growth_threshold, self.decline_threshold
            )));
        }
        Ok(())
    }
}
