//! Domain types for marketboard

pub mod asset;
pub mod bar;
pub mod result;

pub use asset::AssetClass;
pub use bar::Bar;
pub use result::{AggregateResult, HorizonChanges, NOT_AVAILABLE};
