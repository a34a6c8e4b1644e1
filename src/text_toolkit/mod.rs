// Re-export all text processing components
pub mod normalize;
pub mod similarity;

pub use normalize::normalize;
pub use similarity::similarity;
