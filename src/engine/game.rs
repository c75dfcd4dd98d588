//! Game root: map catalogue, one session per map with players, defaults.

use crate::engine::map::{Map, MapCatalogue};
use crate::engine::players::{Player, Players, Token};
use crate::engine::session::GameSession;
use crate::rng::RandomSource;
use std::collections::HashMap;
use std::time::Duration;

pub struct LootGeneratorConfig {
    pub period: Duration,
    pub probability: f64,
}

pub struct Game {
    maps: MapCatalogue,
    sessions: HashMap<String, GameSession>,
    players: Players,
    pub default_dog_speed: f64,
    pub default_bag_capacity: u32,
    pub loot_generator_config: LootGeneratorConfig,
    pub spawn_points_are_random: bool,
}

impl Game {
    pub fn new(loot_generator_config: LootGeneratorConfig) -> Self {
        Self {
            maps: MapCatalogue::new(),
            sessions: HashMap::new(),
            players: Players::new(),
            default_dog_speed: 1.0,
            default_bag_capacity: 3,
            loot_generator_config,
            spawn_points_are_random: false,
        }
    }

    pub fn add_map(&mut self, map: Map) -> Result<(), String> {
        self.maps.add(map)
    }

    pub fn maps(&self) -> &[Map] {
        self.maps.all()
    }

    pub fn find_map(&self, id: &str) -> Option<&Map> {
        self.maps.find(id)
    }

    pub fn players(&self) -> &Players {
        &self.players
    }

    pub fn find_player(&self, token: &str) -> Option<&Player> {
        self.players.find_by_token(token)
    }

    pub fn session(&self, map_id: &str) -> Option<&GameSession> {
        self.sessions.get(map_id)
    }

    pub fn session_mut(&mut self, map_id: &str) -> Option<&mut GameSession> {
        self.sessions.get_mut(map_id)
    }

    /// Creates a player + dog on `map_id`, lazily creating that map's
    /// session on first join. Returns `None` if the map is unknown.
    pub fn add_player(&mut self, name: String, map_id: &str, rng: &dyn RandomSource) -> Option<(Token, u32)> {
        let map = self.maps.find(map_id)?.clone();

        if !self.sessions.contains_key(map_id) {
            let session = GameSession::new(
                &map,
                self.spawn_points_are_random,
                self.loot_generator_config.period,
                self.loot_generator_config.probability,
            );
            self.sessions.insert(map_id.to_string(), session);
        }

        let (token, id) = self.players.add_player(name.clone(), map_id.to_string(), rng);

        let session = self.sessions.get_mut(map_id).expect("session just created");
        session.add_dog(id, name, map.bag_capacity, rng);

        Some((token, id))
    }

    /// Advances every active session by `dt` seconds.
    pub fn set_time_shift(&mut self, dt: f64, rng: &dyn RandomSource) {
        for (map_id, session) in self.sessions.iter_mut() {
            if let Some(map) = self.maps.find(map_id) {
                session.set_time_shift(dt, map, rng);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::{LootType, Road};
    use crate::engine::map::Point;
    use crate::rng::test_support::SequenceRandomSource;

    fn test_map(id: &str) -> Map {
        let mut map = Map::new(
            id.into(),
            "Test".into(),
            1.0,
            3,
            vec![LootType { value: 10 }],
        );
        map.add_road(Road::horizontal(Point { x: 0, y: 0 }, 10));
        map
    }

    fn rng() -> SequenceRandomSource {
        SequenceRandomSource::new(vec![0xAAAA_AAAA_AAAA_AAAA, 0xBBBB_BBBB_BBBB_BBBB])
    }

    #[test]
    fn add_player_on_unknown_map_returns_none() {
        let mut game = Game::new(LootGeneratorConfig { period: Duration::from_secs(1), probability: 0.5 });
        let rng = rng();
        assert!(game.add_player("A".into(), "nope".into(), &rng).is_none());
    }

    #[test]
    fn add_player_creates_session_lazily() {
        let mut game = Game::new(LootGeneratorConfig { period: Duration::from_secs(1), probability: 0.5 });
        game.add_map(test_map("m1")).unwrap();
        let rng = rng();
        assert!(game.session("m1").is_none());
        let (_, id) = game.add_player("A".into(), "m1", &rng).unwrap();
        assert_eq!(id, 0);
        assert_eq!(game.session("m1").unwrap().dogs().len(), 1);
    }

    #[test]
    fn second_player_on_same_map_reuses_session() {
        let mut game = Game::new(LootGeneratorConfig { period: Duration::from_secs(1), probability: 0.5 });
        game.add_map(test_map("m1")).unwrap();
        let rng = rng();
        game.add_player("A".into(), "m1", &rng).unwrap();
        game.add_player("B".into(), "m1", &rng).unwrap();
        assert_eq!(game.session("m1").unwrap().dogs().len(), 2);
    }

    #[test]
    fn duplicate_map_id_rejected() {
        let mut game = Game::new(LootGeneratorConfig { period: Duration::from_secs(1), probability: 0.5 });
        game.add_map(test_map("m1")).unwrap();
        assert!(game.add_map(test_map("m1")).is_err());
    }

    #[test]
    fn set_time_shift_advances_all_sessions() {
        let mut game = Game::new(LootGeneratorConfig { period: Duration::from_secs(1), probability: 0.0 });
        game.add_map(test_map("m1")).unwrap();
        let rng = rng();
        let (_, id) = game.add_player("A".into(), "m1", &rng).unwrap();
        game.session_mut("m1").unwrap().dog_mut(id).unwrap().set_movement(
            Some(crate::engine::dog::Direction::Right),
            1.0,
        );
        game.set_time_shift(1.0, &rng);
        let dog = &game.session("m1").unwrap().dogs()[0];
        assert!((dog.position.x - 1.0).abs() < 1e-9);
    }
}
