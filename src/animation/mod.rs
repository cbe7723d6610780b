pub mod drift;
pub mod easing;
pub mod fade;

pub use drift::Drift;
pub use easing::EasingFunction;
pub use fade::FadeIn;
