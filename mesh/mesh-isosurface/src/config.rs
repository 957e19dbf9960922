//! Extraction parameters.

use mesh_solid::SurfaceEstimatorConfig;

use crate::error::{IsoError, IsoResult};

fn check_delta(delta: f64) -> IsoResult<()> {
    if delta.is_finite() && delta > 0.0 {
        Ok(())
    } else {
        Err(IsoError::InvalidDelta(delta))
    }
}

/// Configuration for [`marching_cubes`](crate::marching_cubes).
#[derive(Debug, Clone, PartialEq)]
pub struct MarchingCubesConfig {
    /// Grid cell size.
    pub delta: f64,
    /// Bisection steps applied to every vertex after extraction.
    /// Zero leaves vertices at edge midpoints.
    pub search_iterations: usize,
    /// Threads used for sampling and refinement. Zero means one per
    /// available core.
    pub workers: usize,
}

impl Default for MarchingCubesConfig {
    fn default() -> Self {
        Self {
            delta: 0.05,
            search_iterations: 0,
            workers: 0,
        }
    }
}

impl MarchingCubesConfig {
    /// Create a configuration with the given cell size and no refinement.
    #[must_use]
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Coarse grid, no refinement.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            delta: 0.1,
            search_iterations: 0,
            workers: 0,
        }
    }

    /// Fine grid with refined vertices.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            delta: 0.02,
            search_iterations: 8,
            workers: 0,
        }
    }

    /// Set the cell size.
    #[must_use]
    pub const fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the number of refinement steps.
    #[must_use]
    pub const fn with_search_iterations(mut self, iterations: usize) -> Self {
        self.search_iterations = iterations;
        self
    }

    /// Set the thread count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`IsoError::InvalidDelta`] for a non-positive or non-finite
    /// cell size.
    pub fn validate(&self) -> IsoResult<()> {
        check_delta(self.delta)
    }
}

/// Configuration for [`dual_contour`](crate::dual_contour).
#[derive(Debug, Clone, PartialEq)]
pub struct DualContourConfig {
    /// Grid cell size.
    pub delta: f64,
    /// Target size of the resident window of grid layers. At least four
    /// layers are kept regardless.
    pub max_memory_bytes: usize,
    /// Weight pulling each solved vertex toward the centroid of its cube's
    /// surface crossings.
    pub regularization: f64,
    /// Clamp solved vertices into their cube.
    pub clip: bool,
    /// Threads used for the per-layer phases. Zero means one per available
    /// core.
    pub workers: usize,
    /// How Hermite points and normals are recovered from the solid.
    pub estimator: SurfaceEstimatorConfig,
}

impl Default for DualContourConfig {
    fn default() -> Self {
        Self {
            delta: 0.05,
            max_memory_bytes: 64 << 20,
            regularization: 0.1,
            clip: true,
            workers: 0,
            estimator: SurfaceEstimatorConfig::default(),
        }
    }
}

impl DualContourConfig {
    /// Create a configuration with the given cell size.
    #[must_use]
    pub fn new(delta: f64) -> Self {
        Self {
            delta,
            ..Self::default()
        }
    }

    /// Coarse grid and cheap surface estimates.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            delta: 0.1,
            estimator: SurfaceEstimatorConfig::preview(),
            ..Self::default()
        }
    }

    /// Fine grid and tight surface estimates.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            delta: 0.02,
            max_memory_bytes: 256 << 20,
            estimator: SurfaceEstimatorConfig::high_quality(),
            ..Self::default()
        }
    }

    /// Set the cell size.
    #[must_use]
    pub const fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the window memory budget.
    #[must_use]
    pub const fn with_max_memory_bytes(mut self, bytes: usize) -> Self {
        self.max_memory_bytes = bytes;
        self
    }

    /// Set the QEF regularization weight.
    #[must_use]
    pub const fn with_regularization(mut self, weight: f64) -> Self {
        self.regularization = weight;
        self
    }

    /// Enable or disable clamping vertices into their cube.
    #[must_use]
    pub const fn with_clip(mut self, clip: bool) -> Self {
        self.clip = clip;
        self
    }

    /// Set the thread count.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the surface estimator parameters.
    #[must_use]
    pub fn with_estimator(mut self, estimator: SurfaceEstimatorConfig) -> Self {
        self.estimator = estimator;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid cell size, a negative or non-finite
    /// regularization weight, or a rejected estimator configuration.
    pub fn validate(&self) -> IsoResult<()> {
        check_delta(self.delta)?;
        if !(self.regularization.is_finite() && self.regularization >= 0.0) {
            return Err(IsoError::InvalidConfig(format!(
                "regularization must be non-negative, got {}",
                self.regularization
            )));
        }
        self.estimator.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        assert!(MarchingCubesConfig::default().validate().is_ok());
        assert!(MarchingCubesConfig::preview().validate().is_ok());
        assert!(MarchingCubesConfig::high_quality().validate().is_ok());
        assert!(DualContourConfig::default().validate().is_ok());
        assert!(DualContourConfig::preview().validate().is_ok());
        assert!(DualContourConfig::high_quality().validate().is_ok());
    }

    #[test]
    fn bad_delta() {
        for delta in [0.0, -0.1, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                MarchingCubesConfig::new(delta).validate(),
                Err(IsoError::InvalidDelta(_))
            ));
            assert!(DualContourConfig::new(delta).validate().is_err());
        }
    }

    #[test]
    fn bad_regularization() {
        let config = DualContourConfig::default().with_regularization(-1.0);
        assert!(matches!(config.validate(), Err(IsoError::InvalidConfig(_))));
        assert!(
            DualContourConfig::default()
                .with_regularization(0.0)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn bad_estimator() {
        let config = DualContourConfig::default()
            .with_estimator(SurfaceEstimatorConfig::default().with_normal_samples(0));
        assert!(matches!(config.validate(), Err(IsoError::Estimator(_))));
    }

    #[test]
    fn builders() {
        let config = MarchingCubesConfig::default()
            .with_delta(0.25)
            .with_search_iterations(4)
            .with_workers(2);
        assert_eq!(config.delta, 0.25);
        assert_eq!(config.search_iterations, 4);
        assert_eq!(config.workers, 2);

        let config = DualContourConfig::default()
            .with_max_memory_bytes(1)
            .with_clip(false);
        assert_eq!(config.max_memory_bytes, 1);
        assert!(!config.clip);
    }
}
