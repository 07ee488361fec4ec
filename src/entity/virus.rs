use glam::Vec2;

use super::cell::{CellData, CellKind, Color};

pub const VIRUS_COLOR: Color = Color::new(51, 255, 51);

/// Spiky hazard. Bursts the player cell that swallows it, and can be fed
/// ejected mass until it shoots a new virus along the last feed angle.
#[derive(Debug, Clone)]
pub struct Virus {
    pub data: CellData,
    /// Ejected-mass feedings since the last shot.
    pub fed: u32,
}

impl Virus {
    pub fn new(node_id: u32, position: Vec2, mass: f32) -> Self {
        let mut data = CellData::new(node_id, CellKind::Virus, position, mass);
        data.color = VIRUS_COLOR;
        Self { data, fed: 0 }
    }
}
