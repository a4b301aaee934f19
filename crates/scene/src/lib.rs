pub mod camera;
pub mod entity;
pub mod environment;
pub mod events;
pub mod headless;
pub mod photo_overlay;
pub mod properties;
pub mod renderer;
pub mod selection;

pub use camera::CameraBridge;
pub use entity::*;
pub use events::*;
pub use renderer::*;
pub use selection::{SelectionController, SelectionState};
