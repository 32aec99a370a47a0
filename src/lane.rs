pub use curve::LaneCurve;
use crate::math::{ParametricCurve2d, Point2d, Vector2d};
use crate::{LaneId, LaneSet};
use smallvec::SmallVec;

mod curve;

/// A single lane of traffic through or around a connection.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane ID.
    id: LaneId,
    /// The centre line of the lane.
    curve: LaneCurve,
    /// Width of the lane in m.
    width: f64,
    /// Speed limit in m/s.
    speed_limit: f64,
    /// The lanes a vehicle may continue onto at the end of this one.
    successors: SmallVec<[LaneId; 4]>,
}

/// The attributes of a lane.
pub struct LaneAttributes<'a> {
    /// A curve defining the centre line of the lane.
    pub curve: &'a dyn ParametricCurve2d,
    /// The width of the lane in m.
    pub width: f64,
    /// The speed limit in m/s.
    pub speed_limit: f64,
}

impl Lane {
    pub(crate) fn new(id: LaneId, attribs: &LaneAttributes) -> Self {
        Self {
            id,
            curve: LaneCurve::new(&attribs.curve),
            width: attribs.width,
            speed_limit: attribs.speed_limit,
            successors: SmallVec::new(),
        }
    }

    pub fn id(&self) -> LaneId {
        self.id
    }

    /// Gets the length of the lane in m.
    pub fn length(&self) -> f64 {
        self.curve.length()
    }

    pub fn curve(&self) -> &LaneCurve {
        &self.curve
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn speed_limit(&self) -> f64 {
        self.speed_limit
    }

    pub fn successors(&self) -> &[LaneId] {
        &self.successors
    }

    pub(crate) fn add_successor(&mut self, lane: LaneId) {
        if !self.successors.contains(&lane) {
            self.successors.push(lane);
        }
    }
}

/// One lane's stretch of a [LanePath].
#[derive(Clone, Copy, Debug)]
struct PathSegment<'a> {
    lane: &'a Lane,
    /// Path position at which this lane takes over.
    start: f64,
    /// Lane position corresponding to `start`.
    offset: f64,
}

/// A route of consecutive lanes, treated as one continuous centre line.
///
/// Path positions are metres from the start of the first lane. Each lane
/// takes over from its predecessor at the point of the new lane closest to the
/// end of the old one.
#[derive(Clone, Debug)]
pub struct LanePath<'a> {
    segments: SmallVec<[PathSegment<'a>; 4]>,
}

impl<'a> LanePath<'a> {
    /// Builds a path from a non-empty route of lanes.
    pub(crate) fn new(lanes: &'a LaneSet, route: &[LaneId]) -> Option<Self> {
        let mut segments = SmallVec::<[PathSegment<'a>; 4]>::new();
        for id in route {
            let lane = lanes.get(*id)?;
            let segment = match segments.last() {
                None => PathSegment {
                    lane,
                    start: 0.0,
                    offset: 0.0,
                },
                Some(prev) => {
                    let end = prev.start + prev.lane.length() - prev.offset;
                    let offset = lane.curve.project(prev.lane.curve.point_at(prev.lane.length()));
                    PathSegment {
                        lane,
                        start: end,
                        offset,
                    }
                }
            };
            segments.push(segment);
        }
        if segments.is_empty() {
            None
        } else {
            Some(Self { segments })
        }
    }

    fn segment(&self, pos: f64) -> &PathSegment<'a> {
        let idx = self
            .segments
            .iter()
            .rposition(|s| s.start <= pos)
            .unwrap_or(0);
        &self.segments[idx]
    }

    /// The lane in use at path position `pos`.
    pub fn lane_at(&self, pos: f64) -> LaneId {
        self.segment(pos).lane.id
    }

    /// The point on the centre line at path position `pos`.
    pub fn point_at(&self, pos: f64) -> Point2d {
        let s = self.segment(pos);
        s.lane.curve.point_at(s.offset + pos - s.start)
    }

    /// The unit tangent of the centre line at path position `pos`.
    pub fn tangent_at(&self, pos: f64) -> Vector2d {
        let s = self.segment(pos);
        s.lane.curve.tangent_at(s.offset + pos - s.start)
    }

    /// The path position at which the last lane ends.
    pub fn length(&self) -> f64 {
        let last = &self.segments[self.segments.len() - 1];
        last.start + last.lane.length() - last.offset
    }

    pub fn lanes(&self) -> impl Iterator<Item = LaneId> + '_ {
        self.segments.iter().map(|s| s.lane.id)
    }
}
