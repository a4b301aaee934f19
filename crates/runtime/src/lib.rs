pub mod event_bus;
pub mod listeners;
pub mod sequencer;

pub use event_bus::*;
pub use listeners::*;
pub use sequencer::*;
