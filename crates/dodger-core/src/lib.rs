//! Data types and pure geometry shared by the dodge controller: positions and
//! angles, approach sectors, the per-frame observations consumed from the host,
//! the virtual clock and the settings.

mod angle;
mod frame;
mod geom;
mod ids;
mod instant;
mod keys;
mod sector;
mod settings;

pub use angle::*;
pub use frame::*;
pub use geom::*;
pub use ids::*;
pub use instant::*;
pub use keys::*;
pub use sector::*;
pub use settings::*;

pub type Vector2 = nalgebra::Vector2<f64>;
