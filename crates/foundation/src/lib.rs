pub mod camera;
pub mod easing;
pub mod encode;
pub mod time;

// Foundation crate: small, well-tested value types only.
pub use camera::*;
pub use easing::*;
pub use encode::*;
pub use time::*;
