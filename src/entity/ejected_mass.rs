use glam::Vec2;

use super::cell::{CellData, CellKind};

/// Ballistic blob of mass thrown out by a player cell. Unowned from the
/// moment it spawns; while in flight it can feed a virus it runs into.
#[derive(Debug, Clone)]
pub struct EjectedMass {
    pub data: CellData,
}

impl EjectedMass {
    pub fn new(node_id: u32, position: Vec2, mass: f32) -> Self {
        Self {
            data: CellData::new(node_id, CellKind::Ejected, position, mass),
        }
    }
}
