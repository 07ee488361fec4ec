use rand::Rng;

use super::{GameMode, LeaderboardEntry};
use crate::entity::Color;
use crate::game::Simulation;
use crate::player::Player;

const TEAM_COUNT: usize = 3;

pub struct Teams;

impl Teams {
    pub fn new() -> Self {
        Self
    }

    fn team_color(&self, team: u8) -> Color {
        let mut rng = rand::rng();
        let fuzz = 38;

        let base = match team {
            0 => (255, 0, 0),
            1 => (0, 255, 0),
            _ => (0, 0, 255),
        };

        let r = (base.0 as i32 + rng.random_range(0..fuzz)).clamp(0, 255) as u8;
        let g = (base.1 as i32 + rng.random_range(0..fuzz)).clamp(0, 255) as u8;
        let b = (base.2 as i32 + rng.random_range(0..fuzz)).clamp(0, 255) as u8;

        Color::new(r, g, b)
    }
}

impl Default for Teams {
    fn default() -> Self {
        Self::new()
    }
}

impl GameMode for Teams {
    fn name(&self) -> &str {
        "Teams"
    }

    fn id(&self) -> u32 {
        1
    }

    fn have_teams(&self) -> bool {
        true
    }

    fn on_player_join(&self, player: &mut Player) {
        if player.team.is_none() {
            let mut rng = rand::rng();
            player.team = Some(rng.random_range(0..TEAM_COUNT as u8));
        }
        if let Some(team) = player.team {
            player.color = self.team_color(team);
        }
    }

    /// Leaderboard carries each team's share of all player mass.
    fn update_leaderboard(&self, sim: &Simulation) -> Vec<LeaderboardEntry> {
        let mut team_mass = [0.0f32; TEAM_COUNT];
        let mut total_mass = 0.0f32;

        for player in sim.players.values() {
            let mass = player.total_mass(&sim.world);
            if let Some(team) = player.team {
                if (team as usize) < TEAM_COUNT {
                    team_mass[team as usize] += mass;
                }
            }
            total_mass += mass;
        }

        let mut entries = Vec::new();
        if total_mass > 0.0 {
            for (i, mass) in team_mass.iter().enumerate() {
                entries.push(LeaderboardEntry {
                    player_id: i as u32,
                    name: format!("Team {i}"),
                    score: mass / total_mass,
                });
            }
        }
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_assigns_team_and_color() {
        let mode = Teams::new();
        let mut player = Player::new(1, "a");
        mode.on_player_join(&mut player);
        assert!(player.team.unwrap() < TEAM_COUNT as u8);
    }

    #[test]
    fn join_keeps_existing_team() {
        let mode = Teams::new();
        let mut player = Player::new(1, "a");
        player.team = Some(2);
        mode.on_player_join(&mut player);
        assert_eq!(player.team, Some(2));
    }
}
