pub mod controller;
pub mod map;

pub use controller::*;
pub use map::*;
