//! Geometry helpers: segment intersection, convex containment, cubic bezier

use glam::Vec2;

use crate::consts::SEGMENT_PARALLEL_EPSILON;

/// Intersection point of segments p1-p2 and p3-p4
///
/// Parallel (or nearly so) segments never intersect, even when collinear.
pub fn segment_intersect(p1: Vec2, p2: Vec2, p3: Vec2, p4: Vec2) -> Option<Vec2> {
    let denom = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if denom.abs() < SEGMENT_PARALLEL_EPSILON {
        return None;
    }

    let t = ((p1.x - p3.x) * (p3.y - p4.y) - (p1.y - p3.y) * (p3.x - p4.x)) / denom;
    let u = -((p1.x - p2.x) * (p1.y - p3.y) - (p1.y - p2.y) * (p1.x - p3.x)) / denom;

    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(p1 + (p2 - p1) * t)
    } else {
        None
    }
}

/// Point-in-convex-polygon via cross-product signs along the winding
///
/// Works for either winding direction. Points on an edge count as inside.
pub fn point_in_convex_polygon(point: Vec2, vertices: &[Vec2]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut sign = 0.0f32;
    for (i, &a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let cross = (b - a).perp_dot(point - a);
        if cross == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Closest point on a segment
pub fn closest_point_on_segment(point: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// A cubic bezier segment
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CubicBezier {
    pub p0: Vec2,
    pub c1: Vec2,
    pub c2: Vec2,
    pub p3: Vec2,
}

impl CubicBezier {
    pub fn new(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2) -> Self {
        Self { p0, c1, c2, p3 }
    }

    pub fn point(&self, t: f32) -> Vec2 {
        bezier_point(self.p0, self.c1, self.c2, self.p3, t)
    }

    pub fn tangent(&self, t: f32) -> f32 {
        bezier_tangent(self.p0, self.c1, self.c2, self.p3, t)
    }

    /// Evenly spaced parameter samples, both ends included
    pub fn samples(&self, count: usize) -> Vec<Vec2> {
        (0..=count)
            .map(|i| self.point(i as f32 / count as f32))
            .collect()
    }

    /// Polyline length over `count` samples
    pub fn approx_length(&self, count: usize) -> f32 {
        self.samples(count)
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum()
    }
}

/// Evaluate a cubic bezier at parameter t
pub fn bezier_point(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let u = 1.0 - t;
    let uu = u * u;
    let tt = t * t;
    u * uu * p0 + 3.0 * uu * t * c1 + 3.0 * u * tt * c2 + t * tt * p3
}

/// Heading angle of a cubic bezier's derivative at parameter t
pub fn bezier_tangent(p0: Vec2, c1: Vec2, c2: Vec2, p3: Vec2, t: f32) -> f32 {
    let u = 1.0 - t;
    let d = 3.0 * u * u * (c1 - p0) + 6.0 * u * t * (c2 - c1) + 3.0 * t * t * (p3 - c2);
    d.y.atan2(d.x)
}

/// Result of a closest-point query on a bezier
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierProjection {
    pub t: f32,
    pub point: Vec2,
    pub distance: f32,
}

/// Closest point on a cubic bezier by uniform parameter sampling
pub fn closest_point_on_cubic_bezier(
    point: Vec2,
    curve: &CubicBezier,
    samples: usize,
) -> BezierProjection {
    let samples = samples.max(1);
    let mut best = BezierProjection {
        t: 0.0,
        point: curve.p0,
        distance: point.distance(curve.p0),
    };
    for i in 1..=samples {
        let t = i as f32 / samples as f32;
        let p = curve.point(t);
        let distance = point.distance(p);
        if distance < best.distance {
            best = BezierProjection { t, point: p, distance };
        }
    }
    best
}
