//! A player's avatar: position, direction, backpack, score, and the
//! per-tick walk along the road graph.

use crate::engine::map::{Map, Point, ROAD_HALF_WIDTH};
use crate::engine::road_graph::{round_point, RoadGraph, RoadId};
use serde::Serialize;

const EPSILON: f64 = 1e-6;

fn check_equal(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() < EPSILON
}

fn less_or_equal(lhs: f64, rhs: f64) -> bool {
    lhs < rhs || check_equal(lhs, rhs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    pub fn as_wire_str(self) -> &'static str {
        match self {
            Direction::Left => "L",
            Direction::Right => "R",
            Direction::Up => "U",
            Direction::Down => "D",
        }
    }

    pub fn from_move_str(s: &str) -> Option<Option<Self>> {
        match s {
            "" => Some(None),
            "L" => Some(Some(Direction::Left)),
            "R" => Some(Some(Direction::Right)),
            "U" => Some(Some(Direction::Up)),
            "D" => Some(Some(Direction::Down)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Speed {
    pub horizontal: f64,
    pub vertical: f64,
}

pub struct Dog {
    pub id: u32,
    pub name: String,
    pub direction: Direction,
    pub position: Position,
    pub speed: Speed,
    pub score: u64,
    backpack: Vec<(u64, usize)>,
    bag_capacity: u32,
    pub current_road: RoadId,
}

impl Dog {
    pub fn new(id: u32, name: String, bag_capacity: u32, current_road: RoadId, position: Position) -> Self {
        Self {
            id,
            name,
            direction: Direction::Up,
            position,
            speed: Speed::default(),
            score: 0,
            backpack: Vec::new(),
            bag_capacity,
            current_road,
        }
    }

    pub fn at(position: Point, bag_capacity: u32, id: u32, name: String, current_road: RoadId) -> Self {
        Self::new(
            id,
            name,
            bag_capacity,
            current_road,
            Position {
                x: position.x as f64,
                y: position.y as f64,
            },
        )
    }

    pub fn backpack(&self) -> &[(u64, usize)] {
        &self.backpack
    }

    pub fn bag_capacity(&self) -> u32 {
        self.bag_capacity
    }

    /// Reference behaviour does not check capacity at pickup time; see
    /// DESIGN.md open question 1. Preserved intentionally.
    pub fn add_to_backpack(&mut self, loot_id: u64, loot_type: usize) {
        self.backpack.push((loot_id, loot_type));
    }

    pub fn empty_backpack(&mut self) -> Vec<(u64, usize)> {
        std::mem::take(&mut self.backpack)
    }

    /// `Stop` is represented as zero velocity with `direction` unchanged,
    /// so clients still see which way the dog is facing while stationary.
    pub fn set_movement(&mut self, dir: Option<Direction>, speed: f64) {
        let Some(dir) = dir else {
            self.speed = Speed::default();
            return;
        };
        self.speed = match dir {
            Direction::Up => Speed { horizontal: 0.0, vertical: -speed },
            Direction::Down => Speed { horizontal: 0.0, vertical: speed },
            Direction::Left => Speed { horizontal: -speed, vertical: 0.0 },
            Direction::Right => Speed { horizontal: speed, vertical: 0.0 },
        };
        self.direction = dir;
    }

    pub fn is_stopped(&self) -> bool {
        self.speed.horizontal == 0.0 && self.speed.vertical == 0.0
    }

    /// Walks the dog for `dt` seconds along `graph`, switching roads at
    /// endpoints, stopping at a map boundary. Mirrors the reference
    /// implementation's per-direction edge-walking loop.
    pub fn advance(&mut self, dt: f64, graph: &RoadGraph) {
        if self.is_stopped() {
            return;
        }
        if self.speed.horizontal != 0.0 {
            self.walk_horizontal(dt, graph);
        } else if self.speed.vertical != 0.0 {
            self.walk_vertical(dt, graph);
        }
    }

    fn walk_horizontal(&mut self, dt: f64, graph: &RoadGraph) {
        let moving_right = self.speed.horizontal > 0.0;
        let mut distance = dt * self.speed.horizontal;

        loop {
            let road = graph.road(self.current_road);
            let edge = if moving_right {
                road.end.x as f64 + ROAD_HALF_WIDTH
            } else {
                road.start.x as f64 - ROAD_HALF_WIDTH
            };

            let target = self.position.x + distance;
            let within = if moving_right {
                less_or_equal(target, edge)
            } else {
                less_or_equal(edge, target)
            };

            if within {
                self.position.x = target;
                if check_equal(target, edge) {
                    self.speed = Speed::default();
                }
                return;
            }

            distance -= edge - self.position.x;
            self.position.x = edge;

            let coord = round_point(self.position.x, self.position.y);
            let neighbour = if moving_right {
                graph.right_neighbour(coord)
            } else {
                graph.left_neighbour(coord)
            };

            match neighbour {
                Some(next) => self.current_road = next,
                None => {
                    self.speed = Speed::default();
                    return;
                }
            }
        }
    }

    fn walk_vertical(&mut self, dt: f64, graph: &RoadGraph) {
        let moving_down = self.speed.vertical > 0.0;
        let mut distance = dt * self.speed.vertical;

        loop {
            let road = graph.road(self.current_road);
            let edge = if moving_down {
                road.end.y as f64 + ROAD_HALF_WIDTH
            } else {
                road.start.y as f64 - ROAD_HALF_WIDTH
            };

            let target = self.position.y + distance;
            let within = if moving_down {
                less_or_equal(target, edge)
            } else {
                less_or_equal(edge, target)
            };

            if within {
                self.position.y = target;
                if check_equal(target, edge) {
                    self.speed = Speed::default();
                }
                return;
            }

            distance -= edge - self.position.y;
            self.position.y = edge;

            let coord = round_point(self.position.x, self.position.y);
            let neighbour = if moving_down {
                graph.down_neighbour(coord)
            } else {
                graph.up_neighbour(coord)
            };

            match neighbour {
                Some(next) => self.current_road = next,
                None => {
                    self.speed = Speed::default();
                    return;
                }
            }
        }
    }
}
