//! Safe SQL builder: identifiers from the registry (or quoted), values as parameters.

mod builder;
mod order;
pub mod params;
pub use builder::*;
pub use order::*;
pub use params::*;
