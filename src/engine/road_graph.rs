//! Per-session derived index: endpoint -> neighbour road, one map per
//! cardinal direction, built once when the session is created.

use crate::engine::map::{Map, Point, Road};
use std::collections::HashMap;

const ROUND_THRESHOLD: f64 = 0.4;

/// `round(c) = floor(c)` if the fractional part is within 0.4 of the
/// integer below, else `floor(c) + 1`. A coordinate that close to an
/// integer is treated as sitting on that grid point for the purpose of
/// deciding whether a dog can switch roads.
pub fn round_coord(c: f64) -> i32 {
    let floor = c.floor();
    let frac = c - floor;
    if frac <= ROUND_THRESHOLD + 1e-6 {
        floor as i32
    } else {
        floor as i32 + 1
    }
}

pub fn round_point(x: f64, y: f64) -> (i32, i32) {
    (round_coord(x), round_coord(y))
}

/// An oriented road: `start.x <= end.x` (horizontal) or `start.y <= end.y`
/// (vertical). Index into the session's `oriented_roads` vector.
pub type RoadId = usize;

#[derive(Debug)]
pub struct RoadGraph {
    pub oriented_roads: Vec<Road>,
    right: HashMap<(i32, i32), RoadId>,
    left: HashMap<(i32, i32), RoadId>,
    up: HashMap<(i32, i32), RoadId>,
    down: HashMap<(i32, i32), RoadId>,
    pub starting_road: RoadId,
}

impl RoadGraph {
    pub fn build(map: &Map) -> Self {
        let mut oriented_roads = Vec::with_capacity(map.roads.len());
        let mut right = HashMap::new();
        let mut left = HashMap::new();
        let mut up = HashMap::new();
        let mut down = HashMap::new();

        for road in &map.roads {
            if road.is_horizontal() {
                let (start, end) = if road.start.x < road.end.x {
                    (road.start, road.end)
                } else {
                    (road.end, road.start)
                };
                let id = oriented_roads.len();
                oriented_roads.push(Road { start, end });
                right.insert((start.x, start.y), id);
                left.insert((end.x, end.y), id);
            } else {
                let (start, end) = if road.start.y < road.end.y {
                    (road.start, road.end)
                } else {
                    (road.end, road.start)
                };
                let id = oriented_roads.len();
                oriented_roads.push(Road { start, end });
                down.insert((start.x, start.y), id);
                up.insert((end.x, end.y), id);
            }
        }

        let starting_road = *right
            .get(&(0, 0))
            .or_else(|| down.get(&(0, 0)))
            .unwrap_or(&0);

        Self {
            oriented_roads,
            right,
            left,
            up,
            down,
            starting_road,
        }
    }

    pub fn road(&self, id: RoadId) -> &Road {
        &self.oriented_roads[id]
    }

    pub fn right_neighbour(&self, p: (i32, i32)) -> Option<RoadId> {
        self.right.get(&p).copied()
    }

    pub fn left_neighbour(&self, p: (i32, i32)) -> Option<RoadId> {
        self.left.get(&p).copied()
    }

    pub fn up_neighbour(&self, p: (i32, i32)) -> Option<RoadId> {
        self.up.get(&p).copied()
    }

    pub fn down_neighbour(&self, p: (i32, i32)) -> Option<RoadId> {
        self.down.get(&p).copied()
    }

    pub fn random_point_on_road(
        &self,
        road_id: RoadId,
        rng: &dyn crate::rng::RandomSource,
    ) -> Point {
        let road = self.road(road_id);
        let x = rng.gen_range_inclusive(road.start.x, road.end.x);
        let y = rng.gen_range_inclusive(road.start.y, road.end.y);
        Point { x, y }
    }

    pub fn road_count(&self) -> usize {
        self.oriented_roads.len()
    }
}
