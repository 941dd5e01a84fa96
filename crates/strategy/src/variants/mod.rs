pub mod confluence;
pub mod momentum;

pub use confluence::ConfluenceValidated;
pub use momentum::MomentumExtreme;
