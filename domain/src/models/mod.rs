mod notification;
mod passenger;
pub mod primitives;

pub use notification::*;
pub use passenger::*;
