pub mod config;
pub mod graph;
pub mod props;
pub mod scenario;
pub mod viewport;

pub use config::{ConfigError, ViewerConfig};
pub use graph::*;
pub use props::ViewportProps;
pub use scenario::{ReplayReport, Scenario, ScenarioError, replay};
pub use viewport::{Phase, Viewport};
