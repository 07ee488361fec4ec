use super::{GameMode, LeaderboardEntry};
use crate::game::Simulation;

pub struct Ffa;

impl Ffa {
    pub fn new() -> Self {
        Self
    }
}

impl Default for Ffa {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Ffa {
    fn name(&self) -> &str {
        "FFA"
    }

    fn id(&self) -> u32 {
        0
    }

    fn update_leaderboard(&self, sim: &Simulation) -> Vec<LeaderboardEntry> {
        let mut entries: Vec<LeaderboardEntry> = sim
            .players
            .values()
            .filter(|p| !p.cells.is_empty())
            .map(|p| LeaderboardEntry {
                player_id: p.id,
                name: p.name.clone(),
                score: p.total_mass(&sim.world),
            })
            .collect();
        entries.sort_by(|a, b| b.score.total_cmp(&a.score));
        entries.truncate(10);
        entries
    }
}
