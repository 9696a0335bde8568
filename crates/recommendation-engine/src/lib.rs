pub mod confidence;
pub mod engine;
pub mod levels;
pub mod penalty;
pub mod reasoning;
pub mod weights;

#[cfg(test)]
mod tests;

pub use confidence::*;
pub use engine::RecommendationEngine;
pub use levels::*;
pub use penalty::*;
pub use weights::*;
