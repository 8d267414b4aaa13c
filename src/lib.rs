pub mod error;
pub mod geom;
pub mod io;
pub mod sim;

// Prelude
pub use error::{Error, Result, ResultCode};
pub use geom::mesh::Mesh;
pub use geom::point::Point;
pub use geom::vector::Vector;
pub use sim::acoustics::source::Source;
pub use sim::materials::Material;
pub use sim::rays::{RunSummary, Settings, Simulation};
pub use sim::scene::{Scene, SceneConfig};
