use std::collections::HashMap;

use glam::Vec2;
use rand::Rng;

use crate::entity::{CellData, CellKind, Color, EjectedMass, Food, PlayerCell, Virus};

/// Fixed palette cycled for player cells and food.
const PALETTE: [Color; 12] = [
    Color::new(235, 75, 0),
    Color::new(225, 125, 255),
    Color::new(180, 7, 20),
    Color::new(80, 170, 240),
    Color::new(180, 90, 135),
    Color::new(195, 240, 0),
    Color::new(150, 18, 255),
    Color::new(80, 245, 0),
    Color::new(165, 25, 0),
    Color::new(80, 145, 0),
    Color::new(80, 170, 240),
    Color::new(55, 92, 255),
];

#[derive(Debug, Clone, Copy)]
pub struct Border {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Border {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn random_position(&self) -> Vec2 {
        let mut rng = rand::rng();
        Vec2::new(
            rng.random_range(self.left..self.right),
            rng.random_range(self.top..self.bottom),
        )
    }
}

/// Tagged storage for every live entity.
#[derive(Debug, Clone)]
pub enum NodeEntry {
    Player(PlayerCell),
    Food(Food),
    Virus(Virus),
    Ejected(EjectedMass),
}

impl NodeEntry {
    pub fn data(&self) -> &CellData {
        match self {
            NodeEntry::Player(c) => &c.data,
            NodeEntry::Food(c) => &c.data,
            NodeEntry::Virus(c) => &c.data,
            NodeEntry::Ejected(c) => &c.data,
        }
    }

    pub fn data_mut(&mut self) -> &mut CellData {
        match self {
            NodeEntry::Player(c) => &mut c.data,
            NodeEntry::Food(c) => &mut c.data,
            NodeEntry::Virus(c) => &mut c.data,
            NodeEntry::Ejected(c) => &mut c.data,
        }
    }

    pub fn kind(&self) -> CellKind {
        match self {
            NodeEntry::Player(_) => CellKind::Player,
            NodeEntry::Food(_) => CellKind::Food,
            NodeEntry::Virus(_) => CellKind::Virus,
            NodeEntry::Ejected(_) => CellKind::Ejected,
        }
    }
}

/// Central entity registry: the id table, per-kind membership lists with
/// O(1) removal, the set of cells under inertial motion, and the border.
pub struct World {
    last_node_id: u32,
    nodes: HashMap<u32, NodeEntry>,

    pub player_nodes: Vec<u32>,
    pub food_nodes: Vec<u32>,
    pub virus_nodes: Vec<u32>,
    pub ejected_nodes: Vec<u32>,
    player_slots: HashMap<u32, usize>,
    food_slots: HashMap<u32, usize>,
    virus_slots: HashMap<u32, usize>,
    ejected_slots: HashMap<u32, usize>,

    pub moving_nodes: Vec<u32>,
    moving_slots: HashMap<u32, usize>,

    pub border: Border,
    /// Live food count. Kept in lock step with `food_nodes` by `insert` and
    /// `remove`; spawn logic reads it against the configured maximum.
    pub current_food: usize,
}

impl World {
    pub fn new(border: Border) -> Self {
        Self {
            last_node_id: 1,
            nodes: HashMap::new(),
            player_nodes: Vec::new(),
            food_nodes: Vec::new(),
            virus_nodes: Vec::new(),
            ejected_nodes: Vec::new(),
            player_slots: HashMap::new(),
            food_slots: HashMap::new(),
            virus_slots: HashMap::new(),
            ejected_slots: HashMap::new(),
            moving_nodes: Vec::new(),
            moving_slots: HashMap::new(),
            border,
            current_food: 0,
        }
    }

    /// Next free node id. Wraps past `i32::MAX` back to 1 (never 0) and
    /// skips ids still held by live entities.
    pub fn next_id(&mut self) -> u32 {
        loop {
            if self.last_node_id > i32::MAX as u32 {
                self.last_node_id = 1;
            }
            let id = self.last_node_id;
            self.last_node_id += 1;
            if !self.nodes.contains_key(&id) {
                return id;
            }
        }
    }

    pub fn random_color() -> Color {
        let mut rng = rand::rng();
        PALETTE[rng.random_range(0..PALETTE.len())]
    }

    pub fn get_node(&self, id: u32) -> Option<&NodeEntry> {
        self.nodes.get(&id)
    }

    pub fn get_node_mut(&mut self, id: u32) -> Option<&mut NodeEntry> {
        self.nodes.get_mut(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (&u32, &NodeEntry)> {
        self.nodes.iter()
    }

    fn attach(list: &mut Vec<u32>, slots: &mut HashMap<u32, usize>, id: u32) {
        slots.insert(id, list.len());
        list.push(id);
    }

    fn detach(list: &mut Vec<u32>, slots: &mut HashMap<u32, usize>, id: u32) {
        let Some(slot) = slots.remove(&id) else {
            return;
        };
        list.swap_remove(slot);
        if let Some(&moved) = list.get(slot) {
            slots.insert(moved, slot);
        }
    }

    pub fn insert(&mut self, entry: NodeEntry) -> u32 {
        let id = entry.data().node_id;
        match entry.kind() {
            CellKind::Player => Self::attach(&mut self.player_nodes, &mut self.player_slots, id),
            CellKind::Food => {
                Self::attach(&mut self.food_nodes, &mut self.food_slots, id);
                self.current_food += 1;
            }
            CellKind::Virus => Self::attach(&mut self.virus_nodes, &mut self.virus_slots, id),
            CellKind::Ejected => Self::attach(&mut self.ejected_nodes, &mut self.ejected_slots, id),
        }
        self.nodes.insert(id, entry);
        id
    }

    /// Removes an entity everywhere it is indexed. No-op when absent.
    pub fn remove(&mut self, id: u32) -> Option<NodeEntry> {
        let entry = self.nodes.remove(&id)?;
        match entry.kind() {
            CellKind::Player => Self::detach(&mut self.player_nodes, &mut self.player_slots, id),
            CellKind::Food => {
                Self::detach(&mut self.food_nodes, &mut self.food_slots, id);
                self.current_food = self.current_food.saturating_sub(1);
            }
            CellKind::Virus => Self::detach(&mut self.virus_nodes, &mut self.virus_slots, id),
            CellKind::Ejected => Self::detach(&mut self.ejected_nodes, &mut self.ejected_slots, id),
        }
        self.remove_moving(id);
        debug_assert_eq!(self.current_food, self.food_nodes.len());
        Some(entry)
    }

    pub fn add_moving(&mut self, id: u32) {
        if self.moving_slots.contains_key(&id) {
            return;
        }
        Self::attach(&mut self.moving_nodes, &mut self.moving_slots, id);
    }

    pub fn remove_moving(&mut self, id: u32) {
        Self::detach(&mut self.moving_nodes, &mut self.moving_slots, id);
    }

    pub fn is_moving(&self, id: u32) -> bool {
        self.moving_slots.contains_key(&id)
    }
}
