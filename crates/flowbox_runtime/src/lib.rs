//! FlowBox runtime glue: subsystem adapters for the adaptive quality
//! controller, a session composition root, and a synthetic load source
//! for demos.

pub mod gameplay;
pub mod physics;
pub mod render;
pub mod session;
pub mod synthetic;

pub use gameplay::{ObjectBudget, ObjectKind};
pub use physics::PhysicsSettings;
pub use render::RenderSettings;
pub use session::{Session, DEFAULT_MAX_RESOLUTION_SCALE, DEFAULT_MAX_SOLVER_ITERATIONS};
pub use synthetic::{LoadPhase, SyntheticLoad};
