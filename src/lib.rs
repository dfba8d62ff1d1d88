pub mod bim;
pub mod building;
pub mod complexity;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod moving;
pub mod transit;
pub mod velocity;
pub mod zone;

pub use bim::Bim;
pub use building::{BBuilding, BLevel, BuildElement, Sign};
pub use complexity::BimComplexity;
pub use error::{BimError, Result};
pub use geometry::{BLine2D, BPoint};
pub use moving::Moving;
pub use transit::Transit;
pub use velocity::{PeopleFlowVelocity, StairDirection};
pub use zone::Zone;
