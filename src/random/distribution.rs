//! Distribution-backed random source.
//!
//! Wraps a continuous probability distribution: each draw samples a
//! value `x` from the distribution and maps it into the unit interval,
//! either through the distribution's cumulative distribution function
//! (the default) or through a logistic squash `1 / (1 + e^-x)`. This
//! lets weighted transitions be driven by shapes other than uniform
//! while still feeding the same `[0, 1)` selection contract.

use rand::distributions::Distribution;
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;

use super::{clamp_unit, RandomSource};

/// How a sampled value is mapped into the unit interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleMode {
    /// Evaluate the distribution's CDF at the sampled value.
    #[default]
    Cdf,
    /// Apply the logistic squash `1 / (1 + e^-x)`.
    Sigmoid,
}

/// Random source backed by a continuous distribution.
///
/// Works with any `statrs` distribution that can both sample (through
/// `rand`) and evaluate its CDF.
///
/// # Example
///
/// ```rust
/// use statrs::distribution::Normal;
/// use stochast::random::{DistributionSource, RandomSource, SampleMode};
///
/// let normal = Normal::new(0.0, 1.0).unwrap();
/// let source = DistributionSource::new(normal, SampleMode::Cdf);
/// let u = source.next_unit();
/// assert!((0.0..1.0).contains(&u));
/// ```
#[derive(Clone, Debug)]
pub struct DistributionSource<D> {
    distribution: D,
    mode: SampleMode,
}

impl<D> DistributionSource<D>
where
    D: Distribution<f64> + ContinuousCDF<f64, f64> + Send + Sync,
{
    pub fn new(distribution: D, mode: SampleMode) -> Self {
        Self { distribution, mode }
    }

    pub fn mode(&self) -> SampleMode {
        self.mode
    }
}

impl<D> RandomSource for DistributionSource<D>
where
    D: Distribution<f64> + ContinuousCDF<f64, f64> + Send + Sync,
{
    fn next_unit(&self) -> f64 {
        let x = self.distribution.sample(&mut rand::thread_rng());
        let u = match self.mode {
            SampleMode::Cdf => self.distribution.cdf(x),
            SampleMode::Sigmoid => 1.0 / (1.0 + (-x).exp()),
        };
        clamp_unit(u)
    }
}
