//! Surface estimation from containment queries alone.
//!
//! A [`Solid`] only answers "inside or not". The extractors still need
//! points on the surface and normals there; both are recovered here by
//! bisection and by probing containment on a small sphere.

use std::f64::consts::PI;

use mesh_types::{Point3, Solid, Vector3};
use tracing::debug;

use crate::error::{SolidError, SolidResult};

/// Bisect the segment `inside`–`outside` toward the surface of `solid`.
///
/// Runs exactly `iterations` containment queries and returns the midpoint
/// of the final bracket, so the error is at most
/// `|outside - inside| / 2^(iterations + 1)`. With zero iterations this is
/// the midpoint of the segment.
///
/// # Example
///
/// ```
/// use mesh_solid::{bisect, Sphere};
/// use mesh_types::Point3;
///
/// let ball = Sphere::new(Point3::origin(), 1.0)?;
/// let p = bisect(&ball, Point3::origin(), Point3::new(2.0, 0.0, 0.0), 40);
/// assert!((p.x - 1.0).abs() < 1e-9);
/// # Ok::<(), mesh_solid::SolidError>(())
/// ```
pub fn bisect<S: Solid + ?Sized>(
    solid: &S,
    inside: Point3<f64>,
    outside: Point3<f64>,
    iterations: usize,
) -> Point3<f64> {
    let (mut inside, mut outside) = (inside, outside);
    for _ in 0..iterations {
        let mid = nalgebra::center(&inside, &outside);
        if solid.contains(&mid) {
            inside = mid;
        } else {
            outside = mid;
        }
    }
    nalgebra::center(&inside, &outside)
}

/// Parameters for [`SolidSurfaceEstimator`].
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceEstimatorConfig {
    /// Bisection steps when locating a surface point on an edge.
    pub bisect_iterations: usize,
    /// Number of probe directions used to estimate a normal.
    pub normal_samples: usize,
    /// Radius of the probe sphere used to estimate a normal.
    pub normal_epsilon: f64,
}

impl Default for SurfaceEstimatorConfig {
    fn default() -> Self {
        Self {
            bisect_iterations: 32,
            normal_samples: 64,
            normal_epsilon: 1e-4,
        }
    }
}

impl SurfaceEstimatorConfig {
    /// Cheap estimates for quick previews.
    #[must_use]
    pub fn preview() -> Self {
        Self {
            bisect_iterations: 16,
            normal_samples: 32,
            normal_epsilon: 1e-3,
        }
    }

    /// Tight estimates for final output.
    #[must_use]
    pub fn high_quality() -> Self {
        Self {
            bisect_iterations: 48,
            normal_samples: 256,
            normal_epsilon: 1e-5,
        }
    }

    /// Set the number of bisection steps.
    #[must_use]
    pub const fn with_bisect_iterations(mut self, iterations: usize) -> Self {
        self.bisect_iterations = iterations;
        self
    }

    /// Set the number of normal probe directions.
    #[must_use]
    pub const fn with_normal_samples(mut self, samples: usize) -> Self {
        self.normal_samples = samples;
        self
    }

    /// Set the normal probe radius.
    #[must_use]
    pub const fn with_normal_epsilon(mut self, epsilon: f64) -> Self {
        self.normal_epsilon = epsilon;
        self
    }

    /// Check the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SolidError::InvalidConfig`] if there are fewer than 4 probe
    /// directions or the probe radius is not a positive finite number.
    pub fn validate(&self) -> SolidResult<()> {
        if self.normal_samples < 4 {
            return Err(SolidError::InvalidConfig(format!(
                "normal_samples must be at least 4, got {}",
                self.normal_samples
            )));
        }
        if !(self.normal_epsilon.is_finite() && self.normal_epsilon > 0.0) {
            return Err(SolidError::InvalidConfig(format!(
                "normal_epsilon must be positive, got {}",
                self.normal_epsilon
            )));
        }
        Ok(())
    }
}

/// Recovers Hermite data (surface point and outward normal) from a solid.
///
/// # Example
///
/// ```
/// use mesh_solid::{SolidSurfaceEstimator, Sphere, SurfaceEstimatorConfig};
/// use mesh_types::Point3;
///
/// let ball = Sphere::new(Point3::origin(), 1.0)?;
/// let est = SolidSurfaceEstimator::new(&ball, &SurfaceEstimatorConfig::default())?;
/// let (p, n) = est.hermite(Point3::origin(), Point3::new(0.0, 2.0, 0.0));
/// assert!((p.y - 1.0).abs() < 1e-6);
/// assert!(n.y > 0.99);
/// # Ok::<(), mesh_solid::SolidError>(())
/// ```
#[derive(Debug)]
pub struct SolidSurfaceEstimator<'a, S: Solid + ?Sized> {
    solid: &'a S,
    bisect_iterations: usize,
    epsilon: f64,
    directions: Vec<Vector3<f64>>,
}

impl<'a, S: Solid + ?Sized> SolidSurfaceEstimator<'a, S> {
    /// Wrap a solid.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`SurfaceEstimatorConfig::validate`].
    pub fn new(solid: &'a S, config: &SurfaceEstimatorConfig) -> SolidResult<Self> {
        config.validate()?;
        let directions = fibonacci_sphere(config.normal_samples);
        debug!(
            directions = directions.len(),
            bisect_iterations = config.bisect_iterations,
            epsilon = config.normal_epsilon,
            "surface estimator ready"
        );
        Ok(Self {
            solid,
            bisect_iterations: config.bisect_iterations,
            epsilon: config.normal_epsilon,
            directions,
        })
    }

    /// The wrapped solid.
    #[must_use]
    pub const fn solid(&self) -> &'a S {
        self.solid
    }

    /// Point on the surface between `inside` and `outside`.
    #[must_use]
    pub fn surface_point(&self, inside: Point3<f64>, outside: Point3<f64>) -> Point3<f64> {
        bisect(self.solid, inside, outside, self.bisect_iterations)
    }

    /// Outward unit normal at a point near the surface.
    ///
    /// Each probe direction is weighted `+1` if the probe lands outside the
    /// solid and `-1` if inside. When every probe agrees, the point is not
    /// within the probe radius of the surface and the x axis is returned.
    #[must_use]
    pub fn normal(&self, point: &Point3<f64>) -> Vector3<f64> {
        let mut inside = 0;
        let mut sum = Vector3::<f64>::zeros();
        for d in &self.directions {
            if self.solid.contains(&(point + d * self.epsilon)) {
                inside += 1;
                sum -= d;
            } else {
                sum += d;
            }
        }
        if inside == 0 || inside == self.directions.len() {
            return Vector3::x();
        }
        sum.try_normalize(f64::EPSILON).unwrap_or_else(Vector3::x)
    }

    /// Surface point on the segment `a`–`b` and the normal there.
    ///
    /// Exactly one of `a` and `b` should be inside the solid; whichever one
    /// is gets used as the inside end of the bisection.
    #[must_use]
    pub fn hermite(&self, a: Point3<f64>, b: Point3<f64>) -> (Point3<f64>, Vector3<f64>) {
        let (inside, outside) = if self.solid.contains(&a) { (a, b) } else { (b, a) };
        let p = self.surface_point(inside, outside);
        (p, self.normal(&p))
    }
}

/// `n` roughly evenly spread unit vectors.
fn fibonacci_sphere(n: usize) -> Vec<Vector3<f64>> {
    let golden_angle = PI * (3.0 - 5f64.sqrt());
    (0..n)
        .map(|i| {
            let i = i as f64;
            let y = 1.0 - 2.0 * (i + 0.5) / n as f64;
            let r = (1.0 - y * y).max(0.0).sqrt();
            let theta = golden_angle * i;
            Vector3::new(r * theta.cos(), y, r * theta.sin())
        })
        .collect()
}
