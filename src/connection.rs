use crate::lane::{Lane, LaneAttributes, LanePath};
use crate::math::{Point2d, Polygon, Vector2d};
use crate::{Error, LaneId, LaneSet, Result};
use pathfinding::directed::dijkstra::dijkstra;

/// Spacing of the coarse search for where a lane enters the area, in m.
const ENTRY_SEARCH_STEP: f64 = 0.25;

/// Bisection iterations used to refine the entry point.
const ENTRY_REFINE_ITERS: usize = 24;

/// A merge or intersection: the shared area vehicles reserve space in,
/// together with the lanes that cross it.
#[derive(Clone, Debug)]
pub struct Connection {
    area: Polygon,
    lanes: LaneSet,
}

/// Where a lane's centre line first enters a connection's area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntryPoint {
    /// Position along the lane in m.
    pub pos: f64,
    /// The entry point itself.
    pub point: Point2d,
    /// Unit tangent of the lane at the entry point.
    pub heading: Vector2d,
}

impl Connection {
    /// Creates a connection covering the given area, with no lanes.
    pub fn new(area: Polygon) -> Self {
        Self {
            area,
            lanes: LaneSet::with_key(),
        }
    }

    pub fn area(&self) -> &Polygon {
        &self.area
    }

    /// Adds a lane to the connection.
    pub fn add_lane(&mut self, attribs: &LaneAttributes) -> LaneId {
        self.lanes.insert_with_key(|id| Lane::new(id, attribs))
    }

    /// Marks `to` as a lane vehicles can continue onto from `from`.
    pub fn add_lane_connection(&mut self, from: LaneId, to: LaneId) -> Result<()> {
        if !self.lanes.contains_key(to) {
            return Err(Error::UnknownLane(to));
        }
        self.lanes
            .get_mut(from)
            .ok_or(Error::UnknownLane(from))?
            .add_successor(to);
        Ok(())
    }

    pub fn lane(&self, id: LaneId) -> Result<&Lane> {
        self.lanes.get(id).ok_or(Error::UnknownLane(id))
    }

    pub fn lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Finds where the centre line of a lane first enters the area.
    pub fn entry_point(&self, id: LaneId) -> Result<EntryPoint> {
        let curve = self.lane(id)?.curve();
        let inside = |pos: f64| self.area.contains(curve.point_at(pos));

        let samples = (curve.length() / ENTRY_SEARCH_STEP).ceil() as usize;
        let first_inside = (0..=samples)
            .map(|i| (i as f64 * ENTRY_SEARCH_STEP).min(curve.length()))
            .position(|pos| inside(pos))
            .ok_or(Error::LaneOutsideArea(id))?;

        let mut pos = first_inside as f64 * ENTRY_SEARCH_STEP;
        if first_inside > 0 {
            let (mut outside, mut inside_pos) = (pos - ENTRY_SEARCH_STEP, pos.min(curve.length()));
            for _ in 0..ENTRY_REFINE_ITERS {
                let mid = 0.5 * (outside + inside_pos);
                if inside(mid) {
                    inside_pos = mid;
                } else {
                    outside = mid;
                }
            }
            pos = inside_pos;
        }
        let pos = pos.min(curve.length());

        Ok(EntryPoint {
            pos,
            point: curve.point_at(pos),
            heading: curve.tangent_at(pos),
        })
    }

    /// Finds the shortest sequence of lanes leading from `from` to `to`.
    pub fn route(&self, from: LaneId, to: LaneId) -> Result<Vec<LaneId>> {
        self.lane(from)?;
        self.lane(to)?;
        dijkstra(
            &from,
            |id| {
                self.lanes[*id]
                    .successors()
                    .iter()
                    .map(|next| (*next, (self.lanes[*next].length() * 1000.0) as u64))
                    .collect::<Vec<_>>()
            },
            |id| *id == to,
        )
        .map(|(route, _)| route)
        .ok_or(Error::NoRoute { from, to })
    }

    /// The centre line followed when travelling from `from` to `to`.
    pub fn path(&self, from: LaneId, to: LaneId) -> Result<LanePath<'_>> {
        let route = self.route(from, to)?;
        LanePath::new(&self.lanes, &route).ok_or(Error::NoRoute { from, to })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::math::{LineSegment2d, Rect};
    use crate::util::Interval;
    use assert_approx_eq::assert_approx_eq;

    fn square_connection() -> Connection {
        Connection::new(Polygon::from_rect(Rect::new(
            Interval::new(0.0, 10.0),
            Interval::new(0.0, 10.0),
        )))
    }

    fn straight(conn: &mut Connection, from: (f64, f64), to: (f64, f64)) -> LaneId {
        let line = LineSegment2d::from_ends(Point2d::new(from.0, from.1), Point2d::new(to.0, to.1));
        conn.add_lane(&LaneAttributes {
            curve: &line,
            width: 3.0,
            speed_limit: 15.0,
        })
    }

    #[test]
    fn entry_point_on_boundary() {
        let mut conn = square_connection();
        let lane = straight(&mut conn, (-7.3, 5.0), (20.0, 5.0));
        let entry = conn.entry_point(lane).unwrap();
        assert_approx_eq!(entry.pos, 7.3, 1e-4);
        assert_approx_eq!(entry.point.x, 0.0, 1e-4);
        assert_approx_eq!(entry.heading.x, 1.0);
        assert!(conn.area().contains(entry.point));
    }

    #[test]
    fn lane_starting_inside() {
        let mut conn = square_connection();
        let lane = straight(&mut conn, (5.0, 5.0), (20.0, 5.0));
        assert_approx_eq!(conn.entry_point(lane).unwrap().pos, 0.0);
    }

    #[test]
    fn lane_missing_the_area() {
        let mut conn = square_connection();
        let lane = straight(&mut conn, (-5.0, 20.0), (20.0, 20.0));
        assert!(matches!(conn.entry_point(lane), Err(Error::LaneOutsideArea(id)) if id == lane));
    }

    #[test]
    fn routes_follow_successors() {
        let mut conn = square_connection();
        let a = straight(&mut conn, (-10.0, 2.0), (5.0, 2.0));
        let b = straight(&mut conn, (5.0, 2.0), (20.0, 2.0));
        let c = straight(&mut conn, (5.0, 2.0), (5.0, 20.0));
        conn.add_lane_connection(a, b).unwrap();
        conn.add_lane_connection(a, c).unwrap();

        assert_eq!(conn.route(a, c).unwrap(), vec![a, c]);
        assert_eq!(conn.route(a, a).unwrap(), vec![a]);
        assert!(matches!(conn.route(b, a), Err(Error::NoRoute { .. })));

        let path = conn.path(a, c).unwrap();
        assert_approx_eq!(path.length(), 33.0, 1e-3);
        assert_eq!(path.lane_at(10.0), a);
        assert_eq!(path.lane_at(20.0), c);
        let p = path.point_at(20.0);
        assert_approx_eq!(p.x, 5.0, 1e-3);
        assert_approx_eq!(p.y, 7.0, 1e-3);
        assert_approx_eq!(path.tangent_at(20.0).y, 1.0);
    }
}
