pub mod params;
pub mod raster;
pub mod wire;

pub use params::*;
pub use raster::*;
pub use wire::*;
