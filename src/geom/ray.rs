//! Acoustic rays and ray/triangle intersection.
//!
//! A [`Ray`] carries everything the tracer needs to reason about one leg of a
//! sound path: where it starts, where it goes, how much energy is left and
//! how far it has travelled from its source.

use crate::geom::triangles::Triangle;
use crate::{Point, Vector};

/// Energy of a freshly emitted ray.
pub const RAY_MAX_ENERGY: f64 = 100.0;

/// Tolerance used by the Möller–Trumbore test.
const INTERSECT_EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point of the ray
    pub origin: Point,
    /// Unit direction, or zero for a degenerate ray
    pub direction: Vector,
    /// Remaining energy in `[0, RAY_MAX_ENERGY]`
    pub energy: f64,
    /// Distance travelled from the source up to `origin`
    pub total_distance: f64,
    pub id: u64,
    pub bounce_count: u32,
}

/// Parametric result of a ray/triangle test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    pub t: f64,
    pub u: f64,
    pub v: f64,
}

/// Closest accepted intersection along a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Point,
    /// Unit triangle normal, oriented against the incoming ray
    pub normal: Vector,
    /// Direction of the specular reflection
    pub reflected: Vector,
    /// Squared distance from the ray origin to `point`
    pub distance_sq: f64,
    /// Index of the triangle that was hit
    pub triangle: usize,
}

impl Hit {
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

impl Ray {
    /// Creates a primary ray with full energy.
    ///
    /// The direction is normalized. A zero direction stays zero.
    pub fn new(origin: Point, direction: Vector) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
            energy: RAY_MAX_ENERGY,
            total_distance: 0.0,
            id: 0,
            bounce_count: 0,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Returns the point along the ray at parameter t.
    ///
    /// point = origin + t * direction
    pub fn point_at(&self, t: f64) -> Point {
        self.origin + self.direction * t
    }

    /// Möller–Trumbore test against a single triangle.
    ///
    /// Returns `None` when the ray is parallel to the triangle plane, misses
    /// it, or the hit lies behind (or at) the origin.
    pub fn intersect_triangle(&self, tri: &Triangle) -> Option<TriangleHit> {
        let (edge1, edge2) = tri.edges();
        let h = self.direction.cross(edge2);
        let det = edge1.dot(h);
        if det.abs() < INTERSECT_EPS {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - tri.vertices[0];
        let u = inv_det * s.dot(h);
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = inv_det * self.direction.dot(q);
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = inv_det * edge2.dot(q);
        if t < INTERSECT_EPS {
            return None;
        }

        Some(TriangleHit { t, u, v })
    }

    /// Tests triangle `idx` and records it in `best` if it is strictly closer
    /// than what `best` already holds.
    ///
    /// Returns `true` if `best` was replaced.
    pub fn record_hit(&self, tri: &Triangle, idx: usize, best: &mut Option<Hit>) -> bool {
        let Some(th) = self.intersect_triangle(tri) else {
            return false;
        };

        let point = self.point_at(th.t);
        let distance_sq = self.origin.distance_squared(&point);
        let best_sq = best.map_or(f64::INFINITY, |h| h.distance_sq);
        if distance_sq >= best_sq {
            return false;
        }

        let mut normal = tri.normal();
        if normal.dot(self.direction) > 0.0 {
            normal = -normal;
        }

        *best = Some(Hit {
            point,
            normal,
            reflected: self.direction.reflect(normal),
            distance_sq,
            triangle: idx,
        });
        true
    }

    /// Scans all triangles and returns the closest hit, if any.
    pub fn closest_hit(&self, triangles: &[Triangle]) -> Option<Hit> {
        let mut best = None;
        for (idx, tri) in triangles.iter().enumerate() {
            self.record_hit(tri, idx, &mut best);
        }
        best
    }

    /// Builds the ray leaving `hit` with the `energy` left after absorption.
    pub fn reflect_at(&self, hit: &Hit, energy: f64, id_stride: u64) -> Ray {
        Ray {
            origin: hit.point,
            direction: hit.reflected.normalize(),
            energy,
            total_distance: self.total_distance + hit.distance(),
            id: self.id + id_stride,
            bounce_count: self.bounce_count + 1,
        }
    }
}
