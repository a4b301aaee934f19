pub mod builtin;
pub mod component;
pub mod fetch;
pub mod module;
pub mod plugin_ref;
pub mod resolver;
pub mod widget;

pub use component::*;
pub use fetch::*;
pub use plugin_ref::*;
pub use resolver::*;
pub use widget::*;
