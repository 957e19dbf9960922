//! Boolean combinations of solids.

use mesh_types::{Aabb, Bounded, Point3, Solid};

use crate::error::{SolidError, SolidResult};

fn union_bounds(solids: &[Box<dyn Solid>]) -> Aabb {
    solids
        .iter()
        .fold(Aabb::empty(), |acc, s| acc.union(&s.bounds()))
}

/// Points inside any operand.
pub struct Union {
    solids: Vec<Box<dyn Solid>>,
    bounds: Aabb,
}

impl Union {
    /// Combine one or more solids.
    ///
    /// # Errors
    ///
    /// Returns [`SolidError::EmptyCombination`] if `solids` is empty.
    pub fn new(solids: Vec<Box<dyn Solid>>) -> SolidResult<Self> {
        if solids.is_empty() {
            return Err(SolidError::EmptyCombination { operation: "union" });
        }
        let bounds = union_bounds(&solids);
        Ok(Self { solids, bounds })
    }
}

impl Bounded for Union {
    fn min(&self) -> Point3<f64> {
        self.bounds.min
    }

    fn max(&self) -> Point3<f64> {
        self.bounds.max
    }
}

impl Solid for Union {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.bounds.contains(point) && self.solids.iter().any(|s| s.contains(point))
    }
}

/// Points inside every operand.
///
/// The bounds are the intersection of the operands' bounds, which may be
/// empty when the operands do not overlap.
pub struct Intersection {
    solids: Vec<Box<dyn Solid>>,
    bounds: Aabb,
}

impl Intersection {
    /// Intersect one or more solids.
    ///
    /// # Errors
    ///
    /// Returns [`SolidError::EmptyCombination`] if `solids` is empty.
    pub fn new(solids: Vec<Box<dyn Solid>>) -> SolidResult<Self> {
        let Some(first) = solids.first() else {
            return Err(SolidError::EmptyCombination {
                operation: "intersection",
            });
        };
        let bounds = solids
            .iter()
            .skip(1)
            .fold(first.bounds(), |acc, s| acc.intersection(&s.bounds()));
        Ok(Self { solids, bounds })
    }
}

impl Bounded for Intersection {
    fn min(&self) -> Point3<f64> {
        self.bounds.min
    }

    fn max(&self) -> Point3<f64> {
        self.bounds.max
    }
}

impl Solid for Intersection {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.bounds.contains(point) && self.solids.iter().all(|s| s.contains(point))
    }
}

/// Points inside `positive` but not inside `negative`.
pub struct Difference {
    positive: Box<dyn Solid>,
    negative: Box<dyn Solid>,
}

impl Difference {
    /// Subtract `negative` from `positive`.
    #[must_use]
    pub fn new(positive: Box<dyn Solid>, negative: Box<dyn Solid>) -> Self {
        Self { positive, negative }
    }
}

impl Bounded for Difference {
    fn min(&self) -> Point3<f64> {
        self.positive.min()
    }

    fn max(&self) -> Point3<f64> {
        self.positive.max()
    }
}

impl Solid for Difference {
    fn contains(&self, point: &Point3<f64>) -> bool {
        self.positive.contains(point) && !self.negative.contains(point)
    }
}
