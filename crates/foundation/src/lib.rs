pub mod bounds;
pub mod date;
pub mod ids;
pub mod time;

// Foundation crate: small, well-tested primitives only.
pub use bounds::*;
pub use date::*;
pub use ids::*;
pub use time::*;
