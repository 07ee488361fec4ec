use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Closed set of entity kinds. Behavior differences between kinds are
/// dispatched by matching on this tag, never stored per instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellKind {
    Player = 0,
    Food = 1,
    Virus = 2,
    Ejected = 3,
}

/// State shared by every entity kind.
///
/// Angles are measured from the +Y axis, so a heading `angle` moves along
/// `(sin(angle), cos(angle))`.
#[derive(Debug, Clone)]
pub struct CellData {
    pub node_id: u32,
    pub owner_id: Option<u32>,
    pub kind: CellKind,
    pub position: Vec2,
    pub mass: f32,
    pub color: Color,
    /// Id of the cell that consumed this one. Set at most once.
    pub killed_by: Option<u32>,
    pub angle: f32,
    pub move_speed: f32,
    pub move_ticks: u32,
    pub move_decay: f32,
}

impl CellData {
    pub fn new(node_id: u32, kind: CellKind, position: Vec2, mass: f32) -> Self {
        Self {
            node_id,
            owner_id: None,
            kind,
            position,
            mass,
            color: Color::new(255, 255, 255),
            killed_by: None,
            angle: 0.0,
            move_speed: 0.0,
            move_ticks: 0,
            move_decay: 1.0,
        }
    }

    /// Radius derived from mass. Strictly monotonic in mass.
    pub fn size(&self) -> f32 {
        (100.0 * self.mass).sqrt()
    }

    /// Base movement speed per tick. Bigger cells are slower.
    pub fn speed(&self) -> f32 {
        2.2 * self.size().powf(-0.439) * 40.0
    }

    /// How deep a predator must overlap this cell before it counts as eaten.
    /// Player cells and viruses are harder to swallow than inert matter.
    pub fn eating_range_bonus(&self) -> f32 {
        match self.kind {
            CellKind::Player | CellKind::Virus => self.size() * 0.4,
            CellKind::Food | CellKind::Ejected => 0.0,
        }
    }

    pub fn add_mass(&mut self, amount: f32) {
        self.mass += amount;
    }

    pub fn set_killer(&mut self, node_id: u32) {
        if self.killed_by.is_none() {
            self.killed_by = Some(node_id);
        }
    }

    /// Arms the inertial move engine: `speed` units per tick, decaying by
    /// `decay` each tick, for `ticks` ticks along the current angle.
    pub fn set_move_engine(&mut self, speed: f32, ticks: u32, decay: f32) {
        self.move_speed = speed;
        self.move_ticks = ticks;
        self.move_decay = decay;
    }

    /// One step of inertial motion.
    pub fn update_move(&mut self) {
        self.position.x += self.angle.sin() * self.move_speed;
        self.position.y += self.angle.cos() * self.move_speed;
        self.move_speed *= self.move_decay;
        self.move_ticks = self.move_ticks.saturating_sub(1);
    }

    /// Hard-wall border: clamp, never reflect.
    pub fn clamp_to(&mut self, left: f32, top: f32, right: f32, bottom: f32) {
        self.position.x = self.position.x.clamp(left, right);
        self.position.y = self.position.y.clamp(top, bottom);
    }

    /// Point-in-box test against this cell's bounding square.
    pub fn aabb_contains(&self, point: Vec2) -> bool {
        let r = self.size();
        point.x >= self.position.x - r
            && point.x <= self.position.x + r
            && point.y >= self.position.y - r
            && point.y <= self.position.y + r
    }
}
