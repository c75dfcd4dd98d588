//! Token-based player registry: mints opaque 32-hex-char bearer tokens
//! and resolves them to players in O(1).
//!
//! A `Player` is a thin handle (id + name + owning map id). The dog's
//! mutable state lives in its `GameSession`, keyed by the same id —
//! player id equals dog id — so there is exactly one place that owns
//! movement/backpack/score state.

use crate::rng::RandomSource;
use std::collections::HashMap;

pub type Token = String;

pub struct Player {
    pub id: u32,
    pub name: String,
    pub map_id: String,
}

#[derive(Default)]
pub struct Players {
    next_id: u32,
    players: HashMap<u32, Player>,
    token_to_id: HashMap<Token, u32>,
    dog_and_map_to_id: HashMap<(u32, String), u32>,
}

impl Players {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh id + token pair and registers a player for `name` on
    /// `map_id`. Returns `(token, player_id)`.
    pub fn add_player(&mut self, name: String, map_id: String, rng: &dyn RandomSource) -> (Token, u32) {
        let id = self.next_id;
        self.next_id += 1;

        let token = Self::generate_token(rng);

        self.players.insert(
            id,
            Player {
                id,
                name,
                map_id: map_id.clone(),
            },
        );
        self.token_to_id.insert(token.clone(), id);
        self.dog_and_map_to_id.insert((id, map_id), id);

        (token, id)
    }

    pub fn find_by_token(&self, token: &str) -> Option<&Player> {
        self.token_to_id.get(token).and_then(|id| self.players.get(id))
    }

    pub fn get(&self, id: u32) -> Option<&Player> {
        self.players.get(&id)
    }

    pub fn find_by_dog_and_map(&self, dog_id: u32, map_id: &str) -> Option<&Player> {
        let id = *self.dog_and_map_to_id.get(&(dog_id, map_id.to_string()))?;
        self.players.get(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// Concatenates two hex-encoded random u64s and retries until the
    /// result is exactly 32 characters. Unpadded hex of a small u64 can
    /// come out shorter than 16 digits, so the retry loop normalises length
    /// rather than zero-padding.
    fn generate_token(rng: &dyn RandomSource) -> Token {
        loop {
            let token = format!("{:x}{:x}", rng.next_u64(), rng.next_u64());
            if token.len() == 32 {
                return token;
            }
        }
    }
}
