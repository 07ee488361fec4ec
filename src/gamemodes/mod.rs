pub mod ffa;
pub mod teams;

use glam::Vec2;

use crate::game::Simulation;
use crate::player::Player;

#[derive(Debug, Clone)]
pub struct LeaderboardEntry {
    pub player_id: u32,
    pub name: String,
    pub score: f32,
}

/// Pluggable match policy. The simulation owns exactly one and calls into it
/// at fixed points; hooks that need the whole simulation take it mutably.
pub trait GameMode: Send + Sync {
    fn name(&self) -> &str;
    fn id(&self) -> u32;

    /// Whether same-team players are protected from eating each other.
    fn have_teams(&self) -> bool {
        false
    }

    /// Multiplier applied to the per-second mass decay rate.
    fn decay_mod(&self) -> f32 {
        1.0
    }

    fn on_server_init(&mut self, _sim: &mut Simulation) {}

    fn on_player_join(&self, _player: &mut Player) {}

    fn on_tick(&mut self, _sim: &mut Simulation) {}

    /// Fired when a player cell swallows an ejected blob. Modes that respawn
    /// seed cells from eaten ejecta hook in here.
    fn on_ejected_consumed(&self, _sim: &mut Simulation, _eater_id: u32, _position: Vec2) {}

    fn update_leaderboard(&self, sim: &Simulation) -> Vec<LeaderboardEntry>;
}

pub fn get_gamemode(id: u32) -> Box<dyn GameMode> {
    match id {
        1 => Box::new(teams::Teams::new()),
        _ => Box::new(ffa::Ffa::new()),
    }
}
