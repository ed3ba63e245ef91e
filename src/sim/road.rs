//! Road variants and their local geometry
//!
//! Every road answers the same two questions: does it contain a point, and
//! where is that point relative to the road's centerline (tangent angle,
//! signed lateral offset, distance along). Lane-level logic in the network
//! is written once against that local frame.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{CubicBezier, closest_point_on_cubic_bezier};
use crate::consts::BEZIER_SAMPLES;
use crate::{heading_vector, left_normal, normalize_angle};

/// Built-in road types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoadKind {
    #[default]
    FourLane,
    TwoLane,
    Dirt,
}

/// Per-type road dimensions and colors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadSpec {
    pub width: f32,
    /// Lane centers relative to the centerline, symmetric around 0
    pub lane_offsets: &'static [f32],
    /// Packed 0xRRGGBB
    pub surface_color: u32,
    pub edge_color: u32,
    /// Major roads cross each other as full intersections
    pub major: bool,
}

const FOUR_LANE: RoadSpec = RoadSpec {
    width: 240.0,
    lane_offsets: &[-75.0, -25.0, 25.0, 75.0],
    surface_color: 0x2a2a2a,
    edge_color: 0xffd700,
    major: true,
};

const TWO_LANE: RoadSpec = RoadSpec {
    width: 120.0,
    lane_offsets: &[-30.0, 30.0],
    surface_color: 0x333333,
    edge_color: 0xcccccc,
    major: false,
};

const DIRT: RoadSpec = RoadSpec {
    width: 80.0,
    lane_offsets: &[-20.0, 20.0],
    surface_color: 0x5c4a32,
    edge_color: 0x3d3122,
    major: false,
};

impl RoadKind {
    pub fn spec(self) -> &'static RoadSpec {
        match self {
            RoadKind::FourLane => &FOUR_LANE,
            RoadKind::TwoLane => &TWO_LANE,
            RoadKind::Dirt => &DIRT,
        }
    }

    pub fn width(self) -> f32 {
        self.spec().width
    }

    pub fn is_major(self) -> bool {
        self.spec().major
    }
}

/// A point's position relative to a road
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    /// Tangent direction of the road at the closest approach
    pub road_angle: f32,
    /// Signed distance along the road's left normal
    pub offset: f32,
    /// Distance along the road from its start
    pub along: f32,
    /// Closest centerline point
    pub center: Vec2,
}

/// Straight road between two endpoints
#[derive(Debug, Clone, PartialEq)]
pub struct StraightRoad {
    pub start: Vec2,
    pub end: Vec2,
    pub kind: RoadKind,
    pub center: Vec2,
    pub length: f32,
    pub angle: f32,
}

impl StraightRoad {
    pub fn new(start: Vec2, end: Vec2, kind: RoadKind) -> Self {
        let d = end - start;
        Self {
            start,
            end,
            kind,
            center: (start + end) * 0.5,
            length: d.length(),
            angle: d.y.atan2(d.x),
        }
    }

    fn local_frame(&self, point: Vec2) -> LocalFrame {
        straight_frame(self.start, self.angle, point)
    }
}

/// Arc road around a center, running counter-clockwise from start to end angle
#[derive(Debug, Clone, PartialEq)]
pub struct CurvedRoad {
    pub center: Vec2,
    pub radius: f32,
    pub start_angle: f32,
    /// Counter-clockwise extent in (0, TAU]; zero only for an empty arc
    pub sweep: f32,
    pub kind: RoadKind,
}

impl CurvedRoad {
    /// An end angle a whole turn or more past the start gives a closed ring
    pub fn new(
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        kind: RoadKind,
    ) -> Self {
        Self {
            center,
            radius,
            start_angle: normalize_angle(start_angle),
            sweep: arc_sweep(start_angle, end_angle),
            kind,
        }
    }

    pub fn end_angle(&self) -> f32 {
        normalize_angle(self.start_angle + self.sweep)
    }

    pub fn is_full_circle(&self) -> bool {
        self.sweep >= TAU
    }

    /// Check if an angle is within the arc's angular extent
    pub fn contains_angle(&self, theta: f32) -> bool {
        self.is_full_circle() || swept_from(self.start_angle, theta) <= self.sweep
    }

    fn local_frame(&self, point: Vec2) -> LocalFrame {
        let rel = point - self.center;
        let r = rel.length();
        let theta = rel.y.atan2(rel.x);
        let swept = swept_from(self.start_angle, theta);
        LocalFrame {
            road_angle: theta + FRAC_PI_2,
            // Left of a counter-clockwise arc is toward its center
            offset: self.radius - r,
            along: swept * self.radius,
            center: self.center + heading_vector(theta) * self.radius,
        }
    }
}

/// Counter-clockwise angle from `start` to `end`, wrapped into (0, TAU]
fn arc_sweep(start: f32, end: f32) -> f32 {
    let raw = end - start;
    if raw.abs() >= TAU {
        return TAU;
    }
    let sweep = raw.rem_euclid(TAU);
    if sweep == 0.0 && raw != 0.0 {
        TAU
    } else {
        sweep
    }
}

/// Counter-clockwise angle from `start` to `theta` in [0, TAU)
fn swept_from(start: f32, theta: f32) -> f32 {
    let swept = normalize_angle(theta - start);
    if swept < 0.0 { swept + TAU } else { swept }
}

/// Control point for an authored path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub pos: Vec2,
    /// Grid crossing: the path passes straight through this point
    #[serde(default)]
    pub straight: bool,
}

impl PathPoint {
    pub fn new(pos: Vec2) -> Self {
        Self { pos, straight: false }
    }

    pub fn crossing(pos: Vec2) -> Self {
        Self { pos, straight: true }
    }
}

/// Smooth road made of cubic bezier segments
#[derive(Debug, Clone, PartialEq)]
pub struct PathRoad {
    pub kind: RoadKind,
    pub segments: Vec<CubicBezier>,
    /// Per-segment arc length
    pub lengths: Vec<f32>,
    /// Arc length at the start of each segment
    pub cumulative: Vec<f32>,
}

impl PathRoad {
    /// Build a path through `points`
    ///
    /// Interior control points follow a Catmull-Rom tangent; at crossing
    /// points the tangent is the segment's own direction so the road runs
    /// straight through the grid.
    pub fn from_points(points: &[PathPoint], kind: RoadKind) -> Self {
        let mut segments = Vec::with_capacity(points.len().saturating_sub(1));
        for i in 0..points.len().saturating_sub(1) {
            let p0 = points[i];
            let p1 = points[i + 1];
            let prev = if i == 0 { p0.pos } else { points[i - 1].pos };
            let next = points.get(i + 2).map_or(p1.pos, |p| p.pos);
            let chord = p1.pos - p0.pos;

            let c1 = if p0.straight {
                p0.pos + chord / 3.0
            } else {
                p0.pos + (p1.pos - prev) / 6.0
            };
            let c2 = if p1.straight {
                p1.pos - chord / 3.0
            } else {
                p1.pos - (next - p0.pos) / 6.0
            };
            segments.push(CubicBezier::new(p0.pos, c1, c2, p1.pos));
        }

        let lengths: Vec<f32> = segments
            .iter()
            .map(|s| s.approx_length(BEZIER_SAMPLES))
            .collect();
        let cumulative = lengths
            .iter()
            .scan(0.0, |acc, len| {
                let start = *acc;
                *acc += len;
                Some(start)
            })
            .collect();

        Self {
            kind,
            segments,
            lengths,
            cumulative,
        }
    }

    fn local_frame(&self, point: Vec2) -> Option<LocalFrame> {
        let (index, hit) = self
            .segments
            .iter()
            .enumerate()
            .map(|(i, seg)| (i, closest_point_on_cubic_bezier(point, seg, BEZIER_SAMPLES)))
            .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))?;
        let road_angle = self.segments[index].tangent(hit.t);
        Some(LocalFrame {
            road_angle,
            offset: (point - hit.point).dot(left_normal(road_angle)),
            along: self.cumulative[index] + hit.t * self.lengths[index],
            center: hit.point,
        })
    }

    /// Distance from a point to the path centerline
    pub fn distance_to(&self, point: Vec2) -> Option<f32> {
        self.segments
            .iter()
            .map(|seg| closest_point_on_cubic_bezier(point, seg, BEZIER_SAMPLES).distance)
            .min_by(f32::total_cmp)
    }
}

/// Straight taper from one road type's width to another's
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRoad {
    pub start: Vec2,
    pub end: Vec2,
    pub from_kind: RoadKind,
    pub to_kind: RoadKind,
    pub length: f32,
    pub angle: f32,
}

impl MergeRoad {
    pub fn new(start: Vec2, end: Vec2, from_kind: RoadKind, to_kind: RoadKind) -> Self {
        let d = end - start;
        Self {
            start,
            end,
            from_kind,
            to_kind,
            length: d.length(),
            angle: d.y.atan2(d.x),
        }
    }

    /// Road width at a distance along the taper
    pub fn width_at(&self, along: f32) -> f32 {
        let t = if self.length > 0.0 {
            (along / self.length).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let a = self.from_kind.width();
        a + (self.to_kind.width() - a) * t
    }

    /// Lane table for the nearer end, scaled to the local width
    fn lanes_at(&self, along: f32) -> (&'static [f32], f32) {
        let kind = if along < self.length * 0.5 {
            self.from_kind
        } else {
            self.to_kind
        };
        (kind.spec().lane_offsets, self.width_at(along) / kind.width())
    }
}

/// A road of any variant
#[derive(Debug, Clone, PartialEq)]
pub enum Road {
    Straight(StraightRoad),
    Curved(CurvedRoad),
    Path(PathRoad),
    Merge(MergeRoad),
}

impl Road {
    /// Road type; merges report their starting type
    pub fn kind(&self) -> RoadKind {
        match self {
            Road::Straight(r) => r.kind,
            Road::Curved(r) => r.kind,
            Road::Path(r) => r.kind,
            Road::Merge(r) => r.from_kind,
        }
    }

    /// Nominal width (the wider end for merges)
    pub fn width(&self) -> f32 {
        match self {
            Road::Merge(r) => r.from_kind.width().max(r.to_kind.width()),
            other => other.kind().width(),
        }
    }

    /// Local frame of a point, regardless of whether it is on the road
    pub fn local_frame(&self, point: Vec2) -> Option<LocalFrame> {
        match self {
            Road::Straight(r) => Some(r.local_frame(point)),
            Road::Curved(r) => Some(r.local_frame(point)),
            Road::Path(r) => r.local_frame(point),
            Road::Merge(r) => Some(straight_frame(r.start, r.angle, point)),
        }
    }

    /// Whether the point lies on the road surface
    pub fn contains(&self, point: Vec2) -> bool {
        match self {
            Road::Straight(r) => {
                let f = r.local_frame(point);
                (0.0..=r.length).contains(&f.along) && f.offset.abs() <= r.kind.width() / 2.0
            }
            Road::Curved(r) => {
                let rel = point - r.center;
                (rel.length() - r.radius).abs() <= r.kind.width() / 2.0
                    && r.contains_angle(rel.y.atan2(rel.x))
            }
            Road::Path(r) => r
                .distance_to(point)
                .is_some_and(|d| d <= r.kind.width() / 2.0),
            Road::Merge(r) => {
                let f = straight_frame(r.start, r.angle, point);
                (0.0..=r.length).contains(&f.along) && f.offset.abs() <= r.width_at(f.along) / 2.0
            }
        }
    }

    /// Lane center offsets valid at a frame
    pub fn lane_offsets_at(&self, frame: &LocalFrame) -> Vec<f32> {
        match self {
            Road::Merge(r) => {
                let (lanes, scale) = r.lanes_at(frame.along);
                lanes.iter().map(|l| l * scale).collect()
            }
            other => other.kind().spec().lane_offsets.to_vec(),
        }
    }

    /// Centerline endpoints (arcs report their angular extremes)
    pub fn endpoints(&self) -> (Vec2, Vec2) {
        match self {
            Road::Straight(r) => (r.start, r.end),
            Road::Merge(r) => (r.start, r.end),
            Road::Curved(r) => (
                r.center + heading_vector(r.start_angle) * r.radius,
                r.center + heading_vector(r.end_angle()) * r.radius,
            ),
            Road::Path(r) => match (r.segments.first(), r.segments.last()) {
                (Some(first), Some(last)) => (first.p0, last.p3),
                _ => (Vec2::ZERO, Vec2::ZERO),
            },
        }
    }

    /// Centerline as a polyline (straight variants give their two endpoints)
    pub fn centerline(&self) -> Vec<Vec2> {
        match self {
            Road::Path(r) => {
                let mut points = Vec::with_capacity(r.segments.len() * BEZIER_SAMPLES + 1);
                for (i, seg) in r.segments.iter().enumerate() {
                    let samples = seg.samples(BEZIER_SAMPLES);
                    // Consecutive segments share an endpoint
                    let skip = usize::from(i > 0);
                    points.extend(samples.into_iter().skip(skip));
                }
                points
            }
            other => {
                let (a, b) = other.endpoints();
                vec![a, b]
            }
        }
    }
}

fn straight_frame(start: Vec2, angle: f32, point: Vec2) -> LocalFrame {
    let rel = point - start;
    let dir = heading_vector(angle);
    let along = rel.dot(dir);
    LocalFrame {
        road_angle: angle,
        offset: rel.dot(left_normal(angle)),
        along,
        center: start + dir * along,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_lane_tables_symmetric() {
        for kind in [RoadKind::FourLane, RoadKind::TwoLane, RoadKind::Dirt] {
            let lanes = kind.spec().lane_offsets;
            let sum: f32 = lanes.iter().sum();
            assert!(sum.abs() < 1e-6, "{kind:?} lanes not symmetric");
            assert!(lanes.iter().all(|l| l.abs() < kind.width() / 2.0));
        }
    }

    #[test]
    fn test_straight_contains_rotated() {
        let road = Road::Straight(StraightRoad::new(
            Vec2::ZERO,
            Vec2::new(1000.0, 1000.0),
            RoadKind::TwoLane,
        ));
        assert!(road.contains(Vec2::new(500.0, 500.0)));
        // 50 units off the diagonal, inside the 60 half-width
        let off = Vec2::new(500.0, 500.0) + left_normal(PI / 4.0) * 50.0;
        assert!(road.contains(off));
        let far = Vec2::new(500.0, 500.0) + left_normal(PI / 4.0) * 70.0;
        assert!(!road.contains(far));
        // Past the end
        assert!(!road.contains(Vec2::new(1100.0, 1100.0)));
    }

    #[test]
    fn test_straight_offset_sign() {
        let road = Road::Straight(StraightRoad::new(
            Vec2::new(-500.0, 0.0),
            Vec2::new(500.0, 0.0),
            RoadKind::FourLane,
        ));
        let frame = road.local_frame(Vec2::new(0.0, 25.0)).unwrap();
        assert!((frame.offset - 25.0).abs() < 1e-5);
        assert!((frame.along - 500.0).abs() < 1e-4);
        assert_eq!(frame.road_angle, 0.0);
    }

    #[test]
    fn test_curved_contains_annulus_sector() {
        let road = Road::Curved(CurvedRoad::new(
            Vec2::ZERO,
            500.0,
            0.0,
            PI / 2.0,
            RoadKind::TwoLane,
        ));
        assert!(road.contains(Vec2::new(500.0 * 0.707, 500.0 * 0.707)));
        // Inside the radial band but outside the angular extent
        assert!(!road.contains(Vec2::new(-500.0, 0.0)));
        // Inside the angular extent but off the band
        assert!(!road.contains(Vec2::new(300.0, 300.0)));
    }

    #[test]
    fn test_curved_wraparound() {
        let arc = CurvedRoad::new(Vec2::ZERO, 100.0, 0.9 * PI, -0.9 * PI, RoadKind::Dirt);
        assert!(arc.contains_angle(PI));
        assert!(!arc.contains_angle(0.0));
    }

    #[test]
    fn test_full_circle_arc_is_a_ring() {
        let road = Road::Curved(CurvedRoad::new(Vec2::ZERO, 300.0, 0.0, TAU, RoadKind::TwoLane));
        for i in 0..8 {
            let theta = i as f32 * TAU / 8.0;
            assert!(road.contains(heading_vector(theta) * 300.0), "angle {theta}");
        }
        assert!(!road.contains(Vec2::ZERO));

        let Road::Curved(arc) = &road else { unreachable!() };
        assert!(arc.is_full_circle());
        let (a, b) = road.endpoints();
        assert!((a - b).length() < 1e-3);
    }

    #[test]
    fn test_arc_sweep_wraps() {
        let arc = CurvedRoad::new(Vec2::ZERO, 100.0, 0.9 * PI, -0.9 * PI, RoadKind::Dirt);
        assert!((arc.sweep - 0.2 * PI).abs() < 1e-4);
        let nearly_round = CurvedRoad::new(Vec2::ZERO, 100.0, -PI, PI * 0.99, RoadKind::Dirt);
        assert!((nearly_round.sweep - 1.99 * PI).abs() < 1e-4);
        assert!(!nearly_round.contains_angle(PI * 0.995));
        assert_eq!(CurvedRoad::new(Vec2::ZERO, 100.0, 1.0, 1.0, RoadKind::Dirt).sweep, 0.0);
    }

    #[test]
    fn test_curved_frame_tangent() {
        let arc = CurvedRoad::new(Vec2::ZERO, 400.0, -PI / 2.0, PI / 2.0, RoadKind::TwoLane);
        let road = Road::Curved(arc);
        let frame = road.local_frame(Vec2::new(420.0, 0.0)).unwrap();
        // At angle 0 a counter-clockwise arc heads +y
        assert!((frame.road_angle - PI / 2.0).abs() < 1e-5);
        // Outside the radius is to the right
        assert!((frame.offset + 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_path_passes_through_points() {
        let points = [
            PathPoint::new(Vec2::new(0.0, 0.0)),
            PathPoint::crossing(Vec2::new(400.0, 0.0)),
            PathPoint::new(Vec2::new(800.0, 300.0)),
        ];
        let path = PathRoad::from_points(&points, RoadKind::TwoLane);
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.cumulative[0], 0.0);
        assert!((path.cumulative[1] - path.lengths[0]).abs() < 1e-4);
        assert!((path.lengths[0] - 400.0).abs() < 1.0);

        let road = Road::Path(path);
        assert!(road.contains(Vec2::new(400.0, 10.0)));
        assert!(!road.contains(Vec2::new(400.0, 200.0)));
        // Straight-through crossing keeps the first segment on the x axis
        let frame = road.local_frame(Vec2::new(200.0, 0.0)).unwrap();
        assert!(frame.road_angle.abs() < 0.05);
    }

    #[test]
    fn test_merge_tapers() {
        let merge = MergeRoad::new(
            Vec2::ZERO,
            Vec2::new(400.0, 0.0),
            RoadKind::FourLane,
            RoadKind::TwoLane,
        );
        assert_eq!(merge.width_at(0.0), 240.0);
        assert_eq!(merge.width_at(400.0), 120.0);
        assert!((merge.width_at(200.0) - 180.0).abs() < 1e-4);

        let road = Road::Merge(merge);
        // 100 off center: inside at the wide end, outside at the narrow end
        assert!(road.contains(Vec2::new(10.0, 100.0)));
        assert!(!road.contains(Vec2::new(390.0, 100.0)));

        let near_end = road.local_frame(Vec2::new(400.0, 0.0)).unwrap();
        assert_eq!(road.lane_offsets_at(&near_end), vec![-30.0, 30.0]);
        let start = road.local_frame(Vec2::ZERO).unwrap();
        assert_eq!(road.lane_offsets_at(&start), vec![-75.0, -25.0, 25.0, 75.0]);
    }
}
