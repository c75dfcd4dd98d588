//! Immutable description of a map: roads, buildings, offices, loot values.

use serde::Serialize;
use std::collections::HashMap;

pub type Coord = i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: Coord,
    pub y: Coord,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Size {
    pub width: Coord,
    pub height: Coord,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Offset {
    pub dx: Coord,
    pub dy: Coord,
}

/// A road oriented so that `start < end` on its axis. Horizontal and
/// vertical roads have a walkable half-width of 0.4 on either side.
#[derive(Debug, Clone, Copy)]
pub struct Road {
    pub start: Point,
    pub end: Point,
}

pub const ROAD_HALF_WIDTH: f64 = 0.4;

impl Road {
    pub fn horizontal(start: Point, end_x: Coord) -> Self {
        Self {
            start,
            end: Point { x: end_x, y: start.y },
        }
    }

    pub fn vertical(start: Point, end_y: Coord) -> Self {
        Self {
            start,
            end: Point { x: start.x, y: end_y },
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.start.y == self.end.y
    }

    pub fn is_vertical(&self) -> bool {
        self.start.x == self.end.x
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Building {
    pub position: Point,
    pub size: Size,
}

#[derive(Debug, Clone, Serialize)]
pub struct Office {
    pub id: String,
    pub position: Point,
    pub offset: Offset,
}

pub const OFFICE_RADIUS: f64 = 0.25;

/// One loot type's score value. Display metadata (sprite, name, ...) is
/// opaque to the simulation; it's echoed to clients straight from the
/// config document's raw JSON instead of being modeled here.
#[derive(Debug, Clone)]
pub struct LootType {
    pub value: u64,
}

#[derive(Debug, Clone)]
pub struct Map {
    pub id: String,
    pub name: String,
    pub dog_speed: f64,
    pub bag_capacity: u32,
    pub roads: Vec<Road>,
    pub buildings: Vec<Building>,
    pub offices: Vec<Office>,
    loot_types: Vec<LootType>,
}

impl Map {
    pub fn new(
        id: String,
        name: String,
        dog_speed: f64,
        bag_capacity: u32,
        loot_types: Vec<LootType>,
    ) -> Self {
        Self {
            id,
            name,
            dog_speed,
            bag_capacity,
            roads: Vec::new(),
            buildings: Vec::new(),
            offices: Vec::new(),
            loot_types,
        }
    }

    pub fn add_road(&mut self, road: Road) {
        self.roads.push(road);
    }

    pub fn add_building(&mut self, building: Building) {
        self.buildings.push(building);
    }

    pub fn add_office(&mut self, office: Office) -> Result<(), String> {
        if self.offices.iter().any(|o| o.id == office.id) {
            return Err(format!("duplicate office id {}", office.id));
        }
        self.offices.push(office);
        Ok(())
    }

    pub fn loot_type_count(&self) -> usize {
        self.loot_types.len()
    }

    pub fn loot_type_value(&self, loot_type: usize) -> Option<u64> {
        self.loot_types.get(loot_type).map(|lt| lt.value)
    }
}

/// Map catalogue keyed by map id. Construction order is preserved so
/// `/api/v1/maps` lists maps in config order.
#[derive(Debug, Default)]
pub struct MapCatalogue {
    maps: Vec<Map>,
    index: HashMap<String, usize>,
}

impl MapCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, map: Map) -> Result<(), String> {
        if self.index.contains_key(&map.id) {
            return Err(format!("map with id {} already exists", map.id));
        }
        self.index.insert(map.id.clone(), self.maps.len());
        self.maps.push(map);
        Ok(())
    }

    pub fn find(&self, id: &str) -> Option<&Map> {
        self.index.get(id).map(|&i| &self.maps[i])
    }

    pub fn all(&self) -> &[Map] {
        &self.maps
    }
}
