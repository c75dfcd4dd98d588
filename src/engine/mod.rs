pub mod collision;
pub mod dog;
pub mod game;
pub mod loot_generator;
pub mod map;
pub mod players;
pub mod road_graph;
pub mod session;
