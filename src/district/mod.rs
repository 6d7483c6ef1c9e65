//! Attribution of classified cells to districts and per-district rollups.

mod aggregate;
mod assign;

use geo::MultiPolygon;
use serde::{Deserialize, Serialize};

pub use aggregate::{aggregate, to_dataframe, DistrictSummary};
pub use assign::assign_cells;

/// How a cell touching several districts is attributed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistrictAssignment {
    /// First intersecting district in layer order.
    #[default]
    FirstMatch,
    /// District sharing the most area with the cell.
    LargestOverlap,
}

/// An administrative area cells are rolled up into.
#[derive(Debug, Clone)]
pub struct District {
    pub id: usize,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl District {
    pub fn new(id: usize, name: Option<String>, geometry: MultiPolygon<f64>) -> Self {
        Self { id, name, geometry }
    }
}
