//! Per-map runtime container: live dogs and loot, plus the tick algorithm
//! that advances movement, resolves collisions, and generates new loot.

use crate::engine::collision::{find_gather_events, Gatherer, Item, Vec2};
use crate::engine::dog::{Direction, Dog};
use crate::engine::loot_generator::LootGenerator;
use crate::engine::map::{Map, Point, OFFICE_RADIUS};
use crate::engine::road_graph::RoadGraph;
use crate::rng::RandomSource;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

const GATHERER_RADIUS: f64 = 0.3;
const LOOT_RADIUS: f64 = 0.0;

#[derive(Debug, Clone, Serialize)]
pub struct Loot {
    #[serde(rename = "type")]
    pub loot_type: usize,
    pub pos: (f64, f64),
}

pub struct GameSession {
    pub map_id: String,
    dogs: Vec<Dog>,
    lost_objects: HashMap<u64, Loot>,
    next_loot_id: u64,
    loot_generator: LootGenerator,
    graph: RoadGraph,
    spawn_points_are_random: bool,
}

impl GameSession {
    pub fn new(
        map: &Map,
        spawn_points_are_random: bool,
        loot_period: Duration,
        loot_probability: f64,
    ) -> Self {
        Self {
            map_id: map.id.clone(),
            dogs: Vec::new(),
            lost_objects: HashMap::new(),
            next_loot_id: 0,
            loot_generator: LootGenerator::new(loot_period, loot_probability),
            graph: RoadGraph::build(map),
            spawn_points_are_random,
        }
    }

    pub fn dogs(&self) -> &[Dog] {
        &self.dogs
    }

    pub fn dogs_mut(&mut self) -> &mut [Dog] {
        &mut self.dogs
    }

    pub fn dog_mut(&mut self, id: u32) -> Option<&mut Dog> {
        self.dogs.iter_mut().find(|d| d.id == id)
    }

    pub fn lost_objects(&self) -> &HashMap<u64, Loot> {
        &self.lost_objects
    }

    /// Places a newly created dog on the map per the spawn rule and adds
    /// it to the session's roster.
    pub fn add_dog(&mut self, id: u32, name: String, bag_capacity: u32, rng: &dyn RandomSource) {
        let (road_id, position) = if self.spawn_points_are_random {
            let road_id = rng.gen_range_inclusive(0, self.graph.road_count() as i32 - 1) as usize;
            let point = self.graph.random_point_on_road(road_id, rng);
            (road_id, point)
        } else {
            let road = self.graph.road(self.graph.starting_road);
            (self.graph.starting_road, road.start)
        };

        let dog = Dog::at(position, bag_capacity, id, name, road_id);
        self.dogs.push(dog);
    }

    /// Advances the session by `dt` seconds: moves every dog, resolves
    /// pickups/deposits in collision order, then generates new loot.
    pub fn set_time_shift(&mut self, dt: f64, map: &Map, rng: &dyn RandomSource) {
        let mut gatherers = Vec::with_capacity(self.dogs.len());
        for dog in &mut self.dogs {
            let start = dog.position;
            dog.advance(dt, &self.graph);
            let end = dog.position;
            gatherers.push(Gatherer {
                start: Vec2::new(start.x, start.y),
                end: Vec2::new(end.x, end.y),
                radius: GATHERER_RADIUS,
            });
        }

        let office_count = map.offices.len();
        let mut items = Vec::with_capacity(office_count + self.lost_objects.len());
        for office in &map.offices {
            items.push(Item {
                position: Vec2::new(office.position.x as f64, office.position.y as f64),
                radius: OFFICE_RADIUS,
            });
        }
        let mut item_to_loot_id: HashMap<usize, u64> = HashMap::new();
        for (i, (&loot_id, loot)) in self.lost_objects.iter().enumerate() {
            items.push(Item {
                position: Vec2::new(loot.pos.0, loot.pos.1),
                radius: LOOT_RADIUS,
            });
            item_to_loot_id.insert(office_count + i, loot_id);
        }

        let events = find_gather_events(&items, &gatherers);

        for event in events {
            let Some(dog) = self.dogs.get_mut(event.gatherer_id) else {
                continue;
            };
            if event.item_id < office_count {
                for (_, loot_type) in dog.empty_backpack() {
                    if let Some(value) = map.loot_type_value(loot_type) {
                        dog.score += value;
                    }
                }
            } else if let Some(&loot_id) = item_to_loot_id.get(&event.item_id) {
                if let Some(loot) = self.lost_objects.remove(&loot_id) {
                    dog.add_to_backpack(loot_id, loot.loot_type);
                }
            }
        }

        let elapsed = Duration::from_secs_f64(dt.max(0.0));
        let to_generate = self.loot_generator.generate(
            elapsed,
            self.lost_objects.len(),
            self.dogs.len(),
            rng,
        );
        for _ in 0..to_generate {
            let road_id = rng.gen_range_inclusive(0, self.graph.road_count() as i32 - 1) as usize;
            let point: Point = self.graph.random_point_on_road(road_id, rng);
            let loot_type = rng.gen_range_inclusive(0, map.loot_type_count() as i32 - 1) as usize;
            let loot = Loot {
                loot_type,
                pos: (point.x as f64, point.y as f64),
            };
            self.lost_objects.insert(self.next_loot_id, loot);
            self.next_loot_id += 1;
        }
    }
}

/// The wire form of a dog's facing: its letter while moving, empty
/// string while stopped (direction is still tracked internally).
pub fn wire_direction_for(direction: Direction, stopped: bool) -> &'static str {
    if stopped {
        ""
    } else {
        direction.as_wire_str()
    }
}
