use glam::Vec2;

use super::cell::{CellData, CellKind};

/// Static pellet. Unowned, eaten on bounding-box contact alone.
#[derive(Debug, Clone)]
pub struct Food {
    pub data: CellData,
}

impl Food {
    pub fn new(node_id: u32, position: Vec2, mass: f32) -> Self {
        Self {
            data: CellData::new(node_id, CellKind::Food, position, mass),
        }
    }
}
