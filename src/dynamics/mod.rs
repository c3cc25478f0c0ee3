//! Velocity integration and velocity exchange between grids.

pub mod impulse;
pub mod integrator;

pub use impulse::BodyMass;
pub use integrator::Integrator;
