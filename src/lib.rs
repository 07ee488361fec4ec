//! Petri simulation core library.

pub mod collision;
pub mod config;
pub mod entity;
pub mod game;
pub mod gamemodes;
pub mod player;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use game::Simulation;
pub use gamemodes::LeaderboardEntry;
pub use player::Player;
pub use world::{NodeEntry, World};
