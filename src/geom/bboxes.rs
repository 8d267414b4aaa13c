use crate::geom::EPS;
use crate::{Point, Vector};

/// Axis-aligned bounding box with a cached midpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
    midpoint: Point,
}

impl BoundingBox {
    pub fn new(min: Point, max: Point) -> Self {
        let midpoint = Point::new(
            (min.x + max.x) * 0.5,
            (min.y + max.y) * 0.5,
            (min.z + max.z) * 0.5,
        );
        Self { min, max, midpoint }
    }

    /// Degenerate box collapsed onto a single point.
    pub fn at(pt: Point) -> Self {
        Self::new(pt, pt)
    }

    /// Smallest box holding all points `pts`. Returns `None` for an empty slice.
    pub fn from_points(pts: &[Point]) -> Option<Self> {
        let first = *pts.first()?;
        let (min, max) = pts
            .iter()
            .skip(1)
            .fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self::new(min, max))
    }

    pub fn from_triangle(vertices: &[Point; 3]) -> Self {
        let [a, b, c] = vertices;
        Self::new(a.min(b).min(c), a.max(b).max(c))
    }

    /// Box enclosing both `self` and `other`.
    pub fn join(&self, other: &Self) -> Self {
        Self::new(self.min.min(&other.min), self.max.max(&other.max))
    }

    pub fn midpoint(&self) -> Point {
        self.midpoint
    }

    /// Size along each axis.
    pub fn extent(&self) -> Vector {
        self.max - self.min
    }

    /// Length of the min-max diagonal.
    pub fn diagonal(&self) -> f64 {
        self.min.distance(&self.max)
    }

    /// Checks whether a point lies inside the box (boundary included).
    pub fn contains(&self, pt: Point) -> bool {
        pt.x >= self.min.x - EPS
            && pt.x <= self.max.x + EPS
            && pt.y >= self.min.y - EPS
            && pt.y <= self.max.y + EPS
            && pt.z >= self.min.z - EPS
            && pt.z <= self.max.z + EPS
    }

    /// Clips the parametric segment `origin + t * dir`, `t` in `[t_min, t_max]`,
    /// against the box (slab test).
    ///
    /// Returns the clipped `(t_enter, t_exit)` or `None` if the segment misses.
    pub fn clip_segment(
        &self,
        origin: Point,
        dir: Vector,
        t_min: f64,
        t_max: f64,
    ) -> Option<(f64, f64)> {
        let o = [origin.x, origin.y, origin.z];
        let d = dir.as_array();
        let lo = [self.min.x, self.min.y, self.min.z];
        let hi = [self.max.x, self.max.y, self.max.z];

        let mut t_enter = t_min;
        let mut t_exit = t_max;
        for axis in 0..3 {
            if d[axis] == 0.0 {
                // Parallel to this slab: must already be inside it
                if o[axis] < lo[axis] || o[axis] > hi[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / d[axis];
            let mut t0 = (lo[axis] - o[axis]) * inv;
            let mut t1 = (hi[axis] - o[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_enter = t_enter.max(t0);
            t_exit = t_exit.min(t1);
            if t_enter > t_exit {
                return None;
            }
        }
        Some((t_enter, t_exit))
    }
}
