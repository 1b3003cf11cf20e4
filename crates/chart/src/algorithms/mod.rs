pub mod preprocessing;
pub mod extraction;
pub mod simplification;
pub mod detection;
pub mod separation;

pub use preprocessing::*;
pub use extraction::*;
pub use detection::*;
pub use separation::*;
