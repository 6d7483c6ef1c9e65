mod index;
mod overlay;

pub use index::PolygonIndex;
pub use overlay::{dissolve, repair, BooleanOverlay, Overlay, OverlayPiece};
pub(crate) use overlay::is_finite;
