//! Road network: road storage, derived intersections, lane queries
//!
//! Intersections are rebuilt from scratch with an O(R²) pairwise scan
//! whenever the road set changes; nothing is maintained incrementally.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::{closest_point_on_segment, segment_intersect};
use super::road::{CurvedRoad, MergeRoad, PathPoint, PathRoad, Road, RoadKind, StraightRoad};
use crate::consts::*;
use crate::{left_normal, normalize_angle};

/// How two roads meet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntersectionKind {
    /// Two roads of the same type crossing
    Full,
    /// A road meeting a road of a different type
    TJunction,
    /// A path ending on another road
    PathT,
    /// A path crossing another road
    PathCross,
}

/// A derived meeting point of two roads
#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub point: Vec2,
    pub size: f32,
    pub kind: IntersectionKind,
    /// Indices of the contributing roads in declaration order
    pub roads: (usize, usize),
    /// Set for full intersections of roads that are not axis-aligned
    pub orientation: Option<f32>,
}

/// Road found under a point
#[derive(Debug, Clone, Copy)]
pub struct RoadHit<'a> {
    pub index: usize,
    pub road: &'a Road,
}

/// Steering hint toward the nearest lane center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneAssist {
    /// Road direction matching the car's travel direction
    pub road_angle: f32,
    pub correction_angle: f32,
    /// 1 on the lane center, fading to 0 at the capture radius
    pub strength: f32,
}

/// A lane center point with its road direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneCenter {
    pub point: Vec2,
    pub angle: f32,
}

/// Per-car lane dwell state driving the assist debounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaneDwell {
    /// Not near any lane center
    #[default]
    Idle,
    /// Near a lane center for this many consecutive ticks
    Dwelling { ticks: u32 },
}

impl LaneDwell {
    pub fn ticks(&self) -> u32 {
        match self {
            LaneDwell::Idle => 0,
            LaneDwell::Dwelling { ticks } => *ticks,
        }
    }

    /// Count one more tick near a lane center
    pub fn advance(&mut self) {
        *self = LaneDwell::Dwelling {
            ticks: self.ticks().saturating_add(1),
        };
    }

    pub fn reset(&mut self) {
        *self = LaneDwell::Idle;
    }

    /// Dwelled long enough for the assist to act
    pub fn is_engaged(&self) -> bool {
        self.ticks() >= LANE_DWELL_TICKS
    }
}

/// All roads plus their derived intersections
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    roads: Vec<Road>,
    intersections: Vec<Intersection>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn intersections(&self) -> &[Intersection] {
        &self.intersections
    }

    fn push(&mut self, road: Road) -> usize {
        self.roads.push(road);
        self.roads.len() - 1
    }

    /// Add a straight road
    pub fn add_road(&mut self, start: Vec2, end: Vec2, kind: RoadKind) -> usize {
        self.push(Road::Straight(StraightRoad::new(start, end, kind)))
    }

    /// Add an arc running counter-clockwise from `start_angle` to `end_angle`
    pub fn add_curved_road(
        &mut self,
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
        kind: RoadKind,
    ) -> usize {
        self.push(Road::Curved(CurvedRoad::new(
            center,
            radius,
            start_angle,
            end_angle,
            kind,
        )))
    }

    /// Add a bezier path through the given points
    pub fn add_path(&mut self, points: &[PathPoint], kind: RoadKind) -> usize {
        self.push(Road::Path(PathRoad::from_points(points, kind)))
    }

    /// Add a straight taper between two road types
    pub fn add_merge(&mut self, start: Vec2, end: Vec2, from: RoadKind, to: RoadKind) -> usize {
        self.push(Road::Merge(MergeRoad::new(start, end, from, to)))
    }

    /// Recompute every intersection from the current road set
    pub fn build_intersections(&mut self) {
        let mut intersections = Vec::new();
        for i in 0..self.roads.len() {
            for j in (i + 1)..self.roads.len() {
                intersections.extend(self.find_intersections(i, j));
            }
        }
        log::debug!(
            "Built {} intersections from {} roads",
            intersections.len(),
            self.roads.len()
        );
        self.intersections = intersections;
    }

    /// First meeting point of two roads, if any
    pub fn find_intersection(&self, a: usize, b: usize) -> Option<Intersection> {
        self.find_intersections(a, b).into_iter().next()
    }

    /// Every meeting point of two roads
    ///
    /// Curved and merge roads never produce intersections.
    pub fn find_intersections(&self, a: usize, b: usize) -> Vec<Intersection> {
        let (Some(road_a), Some(road_b)) = (self.roads.get(a), self.roads.get(b)) else {
            return Vec::new();
        };
        match (road_a, road_b) {
            (Road::Straight(ra), Road::Straight(rb)) => {
                straight_intersection(ra, rb, (a, b)).into_iter().collect()
            }
            (Road::Path(_), Road::Path(_) | Road::Straight(_))
            | (Road::Straight(_), Road::Path(_)) => path_intersections(road_a, road_b, (a, b)),
            _ => Vec::new(),
        }
    }

    /// First road (in declaration order) containing the point
    pub fn is_on_road(&self, point: Vec2) -> Option<RoadHit<'_>> {
        self.roads
            .iter()
            .enumerate()
            .find(|(_, road)| road.contains(point))
            .map(|(index, road)| RoadHit { index, road })
    }

    /// Lane-assist steering hint for a car at `pos` heading `angle`
    ///
    /// Advances or resets `dwell`; only returns a hint once the car has
    /// stayed within the capture radius of a lane center long enough.
    pub fn lane_assist(&self, pos: Vec2, angle: f32, dwell: &mut LaneDwell) -> Option<LaneAssist> {
        let Some(hit) = self.is_on_road(pos) else {
            dwell.reset();
            return None;
        };
        let Some(frame) = hit.road.local_frame(pos) else {
            dwell.reset();
            return None;
        };

        let diff = normalize_angle(angle - frame.road_angle);
        let aligned_forward = diff.abs() < LANE_ALIGNMENT;
        let aligned_reverse = (diff.abs() - PI).abs() < LANE_ALIGNMENT;
        if !aligned_forward && !aligned_reverse {
            dwell.reset();
            return None;
        }

        // Lane tables are symmetric, so flipping the offset is enough for reverse travel
        let offset = if aligned_reverse {
            -frame.offset
        } else {
            frame.offset
        };

        let (lane, lane_dist) = hit
            .road
            .lane_offsets_at(&frame)
            .into_iter()
            .map(|lane| (lane, (offset - lane).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        if lane_dist >= LANE_CAPTURE_RADIUS {
            dwell.reset();
            return None;
        }
        dwell.advance();
        if !dwell.is_engaged() {
            return None;
        }

        Some(LaneAssist {
            road_angle: if aligned_reverse {
                frame.road_angle + PI
            } else {
                frame.road_angle
            },
            correction_angle: -(offset - lane).atan2(LANE_LOOKAHEAD),
            strength: 1.0 - lane_dist / LANE_CAPTURE_RADIUS,
        })
    }

    /// Lane center offset for a road type's lane index
    pub fn lane_offset(kind: RoadKind, lane: usize) -> Option<f32> {
        kind.spec().lane_offsets.get(lane).copied()
    }

    /// Center of `lane` on the road under `point`, level with the point
    pub fn lane_center(&self, point: Vec2, lane: usize) -> Option<LaneCenter> {
        let hit = self.is_on_road(point)?;
        let frame = hit.road.local_frame(point)?;
        let offset = *hit.road.lane_offsets_at(&frame).get(lane)?;
        Some(LaneCenter {
            point: frame.center + left_normal(frame.road_angle) * offset,
            angle: frame.road_angle,
        })
    }

    /// Nearest intersection within `threshold` of the point, with its distance
    pub fn is_at_intersection(&self, point: Vec2, threshold: f32) -> Option<(&Intersection, f32)> {
        self.intersections
            .iter()
            .map(|i| (i, i.point.distance(point)))
            .filter(|(_, d)| *d < threshold)
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }
}

fn straight_intersection(
    a: &StraightRoad,
    b: &StraightRoad,
    roads: (usize, usize),
) -> Option<Intersection> {
    let same_kind = a.kind == b.kind;
    let size = if same_kind {
        a.kind.width()
    } else {
        a.kind.width().max(b.kind.width())
    };

    if let Some(point) = segment_intersect(a.start, a.end, b.start, b.end) {
        let kind = if same_kind && a.kind.is_major() {
            IntersectionKind::Full
        } else {
            IntersectionKind::TJunction
        };
        let axis_aligned = (a.angle / FRAC_PI_2 - (a.angle / FRAC_PI_2).round()).abs() < 1e-3;
        let orientation = (kind == IntersectionKind::Full && !axis_aligned).then_some(a.angle);
        return Some(Intersection {
            point,
            size,
            kind,
            roads,
            orientation,
        });
    }

    // A road that stops on another road's surface forms a T
    let ends_on = |end: Vec2, other: &StraightRoad| {
        let closest = closest_point_on_segment(end, other.start, other.end);
        (closest.distance(end) <= other.kind.width() / 2.0).then_some(closest)
    };
    let point = [a.start, a.end]
        .into_iter()
        .find_map(|end| ends_on(end, b))
        .or_else(|| [b.start, b.end].into_iter().find_map(|end| ends_on(end, a)))?;

    Some(Intersection {
        point,
        size,
        kind: IntersectionKind::TJunction,
        roads,
        orientation: None,
    })
}

fn path_intersections(a: &Road, b: &Road, roads: (usize, usize)) -> Vec<Intersection> {
    let line_a = a.centerline();
    let line_b = b.centerline();
    let size = a.width().max(b.width());
    let mut found: Vec<Intersection> = Vec::new();
    let is_new = |found: &[Intersection], p: Vec2| {
        found
            .iter()
            .all(|i| i.point.distance(p) >= INTERSECTION_PROXIMITY)
    };

    for sa in line_a.windows(2) {
        for sb in line_b.windows(2) {
            if let Some(point) = segment_intersect(sa[0], sa[1], sb[0], sb[1]) {
                if is_new(&found, point) {
                    found.push(Intersection {
                        point,
                        size,
                        kind: IntersectionKind::PathCross,
                        roads,
                        orientation: None,
                    });
                }
            }
        }
    }

    // Endpoints that stop near the other road's centerline
    let (a0, a1) = a.endpoints();
    let (b0, b1) = b.endpoints();
    let candidates = [(a0, &line_b), (a1, &line_b), (b0, &line_a), (b1, &line_a)];
    for (end, line) in candidates {
        let Some(closest) = closest_on_polyline(end, line) else {
            continue;
        };
        if closest.distance(end) <= INTERSECTION_PROXIMITY && is_new(&found, closest) {
            found.push(Intersection {
                point: closest,
                size,
                kind: IntersectionKind::PathT,
                roads,
                orientation: None,
            });
        }
    }

    found
}

fn closest_on_polyline(point: Vec2, line: &[Vec2]) -> Option<Vec2> {
    line.windows(2)
        .map(|w| closest_point_on_segment(point, w[0], w[1]))
        .min_by(|p, q| p.distance_squared(point).total_cmp(&q.distance_squared(point)))
}
