//! Data models for Farewatch

mod alert;
mod offer;

pub use alert::*;
pub use offer::*;
