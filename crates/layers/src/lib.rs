pub mod imagery;
pub mod layer;

pub use imagery::*;
pub use layer::*;
