use glam::Vec2;

use super::cell::{CellData, CellKind};

/// A cell owned and steered by a player.
#[derive(Debug, Clone)]
pub struct PlayerCell {
    pub data: CellData,
    /// Seconds until this cell may merge back into a sibling. Counts down in
    /// the per-second bucket.
    pub recombine_ticks: i32,
    /// Seconds until a disconnected owner's cell is culled. -1 while the
    /// owner is connected.
    pub disconnect_ticks: i32,
    /// Set while the cell is freshly launched out of a burst virus; same-owner
    /// collision is suppressed until the move engine finishes.
    pub ignore_collision: bool,
}

impl PlayerCell {
    pub fn new(node_id: u32, owner_id: u32, position: Vec2, mass: f32) -> Self {
        let mut data = CellData::new(node_id, CellKind::Player, position, mass);
        data.owner_id = Some(owner_id);
        Self {
            data,
            recombine_ticks: 0,
            disconnect_ticks: -1,
            ignore_collision: false,
        }
    }

    /// Restarts the merge countdown: heavier cells wait longer.
    pub fn calc_merge_time(&mut self, base_seconds: i32) {
        self.recombine_ticks = base_seconds + (0.02 * self.data.mass) as i32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_time_scales_with_mass() {
        let mut light = PlayerCell::new(1, 1, Vec2::ZERO, 18.0);
        let mut heavy = PlayerCell::new(2, 1, Vec2::ZERO, 1000.0);
        light.calc_merge_time(30);
        heavy.calc_merge_time(30);
        assert_eq!(light.recombine_ticks, 30);
        assert_eq!(heavy.recombine_ticks, 50);
        assert!(heavy.recombine_ticks > light.recombine_ticks);
    }

    #[test]
    fn starts_connected() {
        let cell = PlayerCell::new(1, 1, Vec2::ZERO, 10.0);
        assert_eq!(cell.disconnect_ticks, -1);
        assert!(!cell.ignore_collision);
    }
}
