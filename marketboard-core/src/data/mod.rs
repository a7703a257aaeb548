//! Bar sources: the provider trait, the live Polygon source, the static
//! fallback snapshot, and the payload decoding boundary.

pub mod decode;
pub mod fallback;
pub mod polygon;
pub mod provider;

pub use decode::{BarDecoder, PolygonAggsDecoder};
pub use fallback::{SnapshotBar, StaticProvider};
pub use polygon::{PolygonProvider, PolygonSettings};
pub use provider::{DataError, DataProvider, DataSource};
