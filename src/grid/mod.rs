mod builder;
mod cell;

pub use builder::build_grid;
pub use cell::{Cell, CellId, Classification, TrafficLevel};
