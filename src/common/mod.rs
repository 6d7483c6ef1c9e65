mod fs;
pub mod io;
mod stats;
mod warnings;

pub(crate) use fs::*;
pub use stats::{mean_std, percentile};
pub use warnings::Warnings;
