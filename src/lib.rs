mod util;
mod params;
mod rng;
mod crack;

pub use util::*;
pub use params::*;
pub use rng::*;
pub use crack::*;
