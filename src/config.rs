// CLI flags and config-document loading.

use crate::engine::game::{Game, LootGeneratorConfig};
use crate::engine::map::{Building, LootType, Map, Office, Offset, Point, Road};
use crate::error::ConfigError;
use clap::Parser;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "strayfinder-backend", version, about = "Lost-and-found game server")]
pub struct CliArgs {
    /// Set the config file path
    #[arg(short = 'c', long = "config-file")]
    pub config_file: PathBuf,

    /// Set the static files root
    #[arg(short = 'w', long = "www-root")]
    pub www_root: PathBuf,

    /// Set the tick period in milliseconds; if omitted, /api/v1/game/tick
    /// becomes available for externally driven ticks
    #[arg(short = 't', long = "tick-period")]
    pub tick_period_ms: Option<u64>,

    /// Spawn dogs at random positions instead of the map's origin road
    #[arg(long = "randomize-spawn-points")]
    pub randomize_spawn_points: bool,
}

impl CliArgs {
    pub fn tick_period(&self) -> Option<Duration> {
        self.tick_period_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Deserialize)]
struct RoadDoc {
    x0: i32,
    y0: i32,
    x1: Option<i32>,
    y1: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct BuildingDoc {
    x: i32,
    y: i32,
    w: i32,
    h: i32,
}

#[derive(Debug, Deserialize)]
struct OfficeDoc {
    id: String,
    x: i32,
    y: i32,
    #[serde(rename = "offsetX")]
    offset_x: i32,
    #[serde(rename = "offsetY")]
    offset_y: i32,
}

#[derive(Debug, Deserialize)]
struct LootTypeDoc {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct MapDoc {
    id: String,
    name: String,
    #[serde(rename = "dogSpeed")]
    dog_speed: Option<f64>,
    #[serde(rename = "bagCapacity")]
    bag_capacity: Option<u32>,
    #[serde(rename = "lootTypes")]
    loot_types: Vec<LootTypeDoc>,
    roads: Vec<RoadDoc>,
    buildings: Vec<BuildingDoc>,
    offices: Vec<OfficeDoc>,
}

#[derive(Debug, Deserialize)]
struct LootGeneratorConfigDoc {
    period: f64,
    probability: f64,
}

#[derive(Debug, Deserialize)]
struct ConfigDoc {
    #[serde(rename = "defaultDogSpeed")]
    default_dog_speed: Option<f64>,
    #[serde(rename = "defaultBagCapacity")]
    default_bag_capacity: Option<u32>,
    #[serde(rename = "lootGeneratorConfig")]
    loot_generator_config: LootGeneratorConfigDoc,
    maps: Vec<MapDoc>,
}

/// Raw `lootTypes` JSON, kept per map id, to echo back to clients
/// verbatim (including any fields the simulation core does not care
/// about). Parsed separately from `MapDoc` because `serde_json::Value`
/// preserves fields `LootTypeDoc` would otherwise drop.
pub type FrontendData = HashMap<String, serde_json::Value>;

pub struct LoadedConfig {
    pub game: Game,
    pub frontend_data: FrontendData,
}

pub fn load(path: &std::path::Path) -> Result<LoadedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let doc: ConfigDoc = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    // Kept as a second raw pass so unknown lootTypes fields survive even
    // though MapDoc's own LootTypeDoc only extracts `value`.
    let raw: serde_json::Value = serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    let mut frontend_data = FrontendData::new();
    if let Some(maps) = raw.get("maps").and_then(|v| v.as_array()) {
        for map_doc in maps {
            if let (Some(id), Some(loot_types)) = (
                map_doc.get("id").and_then(|v| v.as_str()),
                map_doc.get("lootTypes"),
            ) {
                frontend_data.insert(id.to_string(), loot_types.clone());
            }
        }
    }

    let mut game = Game::new(LootGeneratorConfig {
        period: Duration::from_secs_f64(doc.loot_generator_config.period),
        probability: doc.loot_generator_config.probability,
    });
    if let Some(speed) = doc.default_dog_speed {
        game.default_dog_speed = speed;
    }
    if let Some(cap) = doc.default_bag_capacity {
        game.default_bag_capacity = cap;
    }

    for map_doc in doc.maps {
        let dog_speed = map_doc.dog_speed.unwrap_or(game.default_dog_speed);
        let bag_capacity = map_doc.bag_capacity.unwrap_or(game.default_bag_capacity);

        let loot_types = map_doc
            .loot_types
            .into_iter()
            .map(|lt| LootType { value: lt.value })
            .collect();

        let mut map = Map::new(map_doc.id.clone(), map_doc.name, dog_speed, bag_capacity, loot_types);

        for road in map_doc.roads {
            let start = Point { x: road.x0, y: road.y0 };
            if let Some(x1) = road.x1 {
                map.add_road(Road::horizontal(start, x1));
            } else if let Some(y1) = road.y1 {
                map.add_road(Road::vertical(start, y1));
            } else {
                return Err(ConfigError::InvalidMap(format!(
                    "road on map {} has neither x1 nor y1",
                    map_doc.id
                )));
            }
        }

        for building in map_doc.buildings {
            map.add_building(Building {
                position: Point { x: building.x, y: building.y },
                size: crate::engine::map::Size {
                    width: building.w,
                    height: building.h,
                },
            });
        }

        for office in map_doc.offices {
            map.add_office(Office {
                id: office.id,
                position: Point { x: office.x, y: office.y },
                offset: Offset { dx: office.offset_x, dy: office.offset_y },
            })
            .map_err(ConfigError::InvalidMap)?;
        }

        game.add_map(map).map_err(ConfigError::DuplicateMap)?;
    }

    Ok(LoadedConfig { game, frontend_data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_doc() -> &'static str {
        r#"{
            "defaultDogSpeed": 3.0,
            "defaultBagCapacity": 2,
            "lootGeneratorConfig": { "period": 5.0, "probability": 0.5 },
            "maps": [
                {
                    "id": "map1",
                    "name": "First",
                    "lootTypes": [
                        { "value": 10, "name": "key", "file": "key.obj" },
                        { "value": 20, "name": "wallet" }
                    ],
                    "roads": [
                        { "x0": 0, "y0": 0, "x1": 10 },
                        { "x0": 10, "y0": 0, "y1": 10 }
                    ],
                    "buildings": [ { "x": 1, "y": 1, "w": 2, "h": 2 } ],
                    "offices": [ { "id": "o1", "x": 5, "y": 0, "offsetX": 0, "offsetY": 1 } ]
                }
            ]
        }"#
    }

    #[test]
    fn loads_maps_roads_buildings_offices() {
        let mut file = tempfile_with(sample_doc());
        let loaded = load(file.path()).unwrap();
        let map = loaded.game.find_map("map1").unwrap();
        assert_eq!(map.name, "First");
        assert_eq!(map.roads.len(), 2);
        assert_eq!(map.buildings.len(), 1);
        assert_eq!(map.offices.len(), 1);
        assert_eq!(map.loot_type_count(), 2);
        assert_eq!(map.dog_speed, 3.0);
        assert_eq!(map.bag_capacity, 2);
        file.close_and_keep();
    }

    #[test]
    fn preserves_unknown_loot_type_fields_for_frontend_echo() {
        let mut file = tempfile_with(sample_doc());
        let loaded = load(file.path()).unwrap();
        let raw = loaded.frontend_data.get("map1").unwrap();
        let entries = raw.as_array().unwrap();
        assert_eq!(entries[0]["name"], "key");
        assert_eq!(entries[0]["file"], "key.obj");
        file.close_and_keep();
    }

    #[test]
    fn rejects_malformed_json() {
        let mut file = tempfile_with("{ not json");
        let err = load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        file.close_and_keep();
    }

    #[test]
    fn rejects_missing_file() {
        let err = load(std::path::Path::new("/nonexistent/path.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    // Minimal scratch-file helper so tests don't depend on an external
    // tempfile crate.
    struct ScratchFile {
        path: PathBuf,
    }

    impl ScratchFile {
        fn path(&self) -> &std::path::Path {
            &self.path
        }

        fn close_and_keep(&mut self) {
            let _ = std::fs::remove_file(&self.path);
        }
    }

    fn tempfile_with(contents: &str) -> ScratchFile {
        let path = std::env::temp_dir().join(format!(
            "strayfinder-config-test-{}.json",
            std::process::id().wrapping_add(contents.len() as u32)
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        ScratchFile { path }
    }
}
