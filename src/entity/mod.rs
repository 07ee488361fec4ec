pub mod cell;
pub mod ejected_mass;
pub mod food;
pub mod player_cell;
pub mod virus;

pub use cell::{CellData, CellKind, Color};
pub use ejected_mass::EjectedMass;
pub use food::Food;
pub use player_cell::PlayerCell;
pub use virus::Virus;
