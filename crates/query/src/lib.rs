pub mod bootstrap;
pub mod compiler;
pub mod keywords;
pub mod predicate;
pub mod record;
pub mod sql;

pub use bootstrap::*;
pub use compiler::*;
pub use keywords::*;
pub use predicate::*;
pub use record::*;
pub use sql::*;
