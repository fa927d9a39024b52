pub mod event_type;
pub mod selection;
pub mod sentiment;
pub mod slider;
pub mod state;
pub mod store;

pub use event_type::*;
pub use selection::*;
pub use sentiment::*;
pub use slider::*;
pub use state::*;
pub use store::*;
