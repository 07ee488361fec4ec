use glam::Vec2;

use crate::entity::Color;
use crate::world::World;

/// One connected (or lingering) player: steering input, owned cells, and the
/// observer state a transport layer drains to build update packets.
pub struct Player {
    pub id: u32,
    pub name: String,
    pub color: Color,
    pub team: Option<u8>,
    /// Current steering target in world coordinates.
    pub mouse: Vec2,
    /// Ids of the player cells this player owns.
    pub cells: Vec<u32>,
    /// Entities currently inside the view box. The collision resolver
    /// enumerates candidates from this set.
    pub visible_nodes: Vec<u32>,
    pub node_addition_queue: Vec<u32>,
    pub node_destroy_queue: Vec<u32>,
    pub disconnected: bool,

    pub center: Vec2,
    pub scale: f32,
    view_min: Vec2,
    view_max: Vec2,
}

impl Player {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            color: Color::new(255, 255, 255),
            team: None,
            mouse: Vec2::ZERO,
            cells: Vec::new(),
            visible_nodes: Vec::new(),
            node_addition_queue: Vec::new(),
            node_destroy_queue: Vec::new(),
            disconnected: false,
            center: Vec2::ZERO,
            scale: 1.0,
            view_min: Vec2::ZERO,
            view_max: Vec2::ZERO,
        }
    }

    pub fn in_view(&self, position: Vec2) -> bool {
        position.x >= self.view_min.x
            && position.x <= self.view_max.x
            && position.y >= self.view_min.y
            && position.y <= self.view_max.y
    }

    pub fn total_mass(&self, world: &World) -> f32 {
        self.cells
            .iter()
            .filter_map(|id| world.get_node(*id))
            .map(|node| node.data().mass)
            .sum()
    }

    /// Hands the queued add/remove events to the transport layer.
    pub fn drain_node_events(&mut self) -> (Vec<u32>, Vec<u32>) {
        (
            std::mem::take(&mut self.node_addition_queue),
            std::mem::take(&mut self.node_destroy_queue),
        )
    }

    fn update_center(&mut self, world: &World) {
        let mut sum = Vec2::ZERO;
        let mut count = 0;
        for id in &self.cells {
            if let Some(node) = world.get_node(*id) {
                sum += node.data().position;
                count += 1;
            }
        }
        if count > 0 {
            self.center = sum / count as f32;
        }
    }

    fn update_scale(&mut self, world: &World) {
        let total_size: f32 = self
            .cells
            .iter()
            .filter_map(|id| world.get_node(*id))
            .map(|node| node.data().size())
            .sum();
        if total_size > 0.0 {
            self.scale = (64.0 / total_size).min(1.0).powf(0.4);
        }
    }

    /// Refreshes center, zoom scale, the view box, and the visible set from
    /// the current registry state.
    pub fn update_view(&mut self, world: &World, view_base: f32) {
        self.update_center(world);
        self.update_scale(world);
        let half = view_base / self.scale / 2.0;
        self.view_min = self.center - Vec2::splat(half);
        self.view_max = self.center + Vec2::splat(half);
        self.visible_nodes.clear();
        for (&id, node) in world.iter_nodes() {
            if self.in_view(node.data().position) {
                self.visible_nodes.push(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Food, PlayerCell};
    use crate::world::{Border, NodeEntry};

    fn world() -> World {
        World::new(Border::new(0.0, 0.0, 6000.0, 6000.0))
    }

    #[test]
    fn view_includes_nearby_and_excludes_far() {
        let mut w = world();
        let cell_id = w.next_id();
        w.insert(NodeEntry::Player(PlayerCell::new(
            cell_id,
            1,
            Vec2::new(3000.0, 3000.0),
            10.0,
        )));
        let near = w.next_id();
        w.insert(NodeEntry::Food(Food::new(near, Vec2::new(3100.0, 3000.0), 1.0)));
        let far = w.next_id();
        w.insert(NodeEntry::Food(Food::new(far, Vec2::new(50.0, 50.0), 1.0)));

        let mut player = Player::new(1, "a");
        player.cells.push(cell_id);
        player.update_view(&w, 1024.0);

        assert!(player.visible_nodes.contains(&near));
        assert!(player.visible_nodes.contains(&cell_id));
        assert!(!player.visible_nodes.contains(&far));
    }

    #[test]
    fn total_mass_sums_live_cells_only() {
        let mut w = world();
        let a = w.next_id();
        w.insert(NodeEntry::Player(PlayerCell::new(a, 1, Vec2::ZERO, 20.0)));
        let mut player = Player::new(1, "a");
        player.cells.push(a);
        player.cells.push(999); // stale id
        assert_eq!(player.total_mass(&w), 20.0);
    }

    #[test]
    fn drain_empties_queues() {
        let mut player = Player::new(1, "a");
        player.node_addition_queue.push(5);
        player.node_destroy_queue.push(6);
        let (added, removed) = player.drain_node_events();
        assert_eq!(added, vec![5]);
        assert_eq!(removed, vec![6]);
        assert!(player.node_addition_queue.is_empty());
        assert!(player.node_destroy_queue.is_empty());
    }
}
