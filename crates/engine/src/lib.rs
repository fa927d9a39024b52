pub mod bootstrap;
pub mod engine;
pub mod error;
pub mod executor;
pub mod result;
#[cfg(any(test, feature = "testing"))]
pub mod scripted;

pub use bootstrap::*;
pub use engine::*;
pub use error::*;
pub use executor::*;
pub use result::*;
#[cfg(any(test, feature = "testing"))]
pub use scripted::*;
