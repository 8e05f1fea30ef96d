pub mod motion;

pub use motion::ReducedMotion;
